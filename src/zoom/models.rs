//! Wire types for the Zoom cloud recording endpoints.
//!
//! Only the fields the archiver reads are modelled; everything else in the
//! payloads is ignored by serde.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MP4_FILE_TYPE: &str = "MP4";

/// Meeting IDs come back as numbers for scheduled meetings, but the API also
/// hands out string identifiers, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeetingId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingId::Numeric(id) => write!(f, "{id}"),
            MeetingId::Text(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// One page of `GET /users/me/recordings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingsPage {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub total_records: Option<u64>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

impl RecordingsPage {
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Descriptor such as `GMT+08:00`.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub recording_files: Vec<RecordingFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
    /// UTC start of this file, `YYYY-MM-DDTHH:MM:SSZ`.
    #[serde(default)]
    pub recording_start: Option<String>,
    #[serde(default)]
    pub recording_end: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RecordingFile {
    pub fn is_mp4(&self) -> bool {
        self.file_type.as_deref() == Some(MP4_FILE_TYPE)
    }
}

/// Date range passed to the listing endpoint. `to` is left to the server
/// default (today) when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingWindow {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl RecordingWindow {
    /// Window starting `months` calendar months before `today`. Days that do
    /// not exist in the earlier month (Feb 29) clamp to the month's last day.
    pub fn lookback(today: NaiveDate, months: u32) -> Self {
        let from = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: None }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("from", self.from.format("%Y-%m-%d").to_string())];
        if let Some(to) = self.to {
            query.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_id_accepts_numbers_and_strings() {
        let numeric: MeetingId = serde_json::from_str("85012345678").unwrap();
        let text: MeetingId = serde_json::from_str("\"abc==\"").unwrap();
        assert_eq!(numeric, MeetingId::Numeric(85012345678));
        assert_eq!(numeric.to_string(), "85012345678");
        assert_eq!(text.to_string(), "abc==");
    }

    #[test]
    fn test_recordings_page_parses_minimal_payload() {
        let page: RecordingsPage = serde_json::from_str(
            r#"{
                "from": "2022-09-05",
                "to": "2023-09-05",
                "next_page_token": "",
                "meetings": [{
                    "id": 123,
                    "topic": "Weekly sync",
                    "timezone": "GMT+08:00",
                    "recording_files": [
                        {"file_type": "MP4", "download_url": "https://x/1", "recording_start": "2023-09-05T05:00:32Z"},
                        {"file_type": "M4A", "download_url": "https://x/2", "recording_start": "2023-09-05T05:00:32Z"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        assert!(page.next_token().is_none());
        assert_eq!(page.meetings.len(), 1);
        let files = &page.meetings[0].recording_files;
        assert!(files[0].is_mp4());
        assert!(!files[1].is_mp4());
    }

    #[test]
    fn test_missing_meetings_defaults_to_empty() {
        let page: RecordingsPage = serde_json::from_str("{}").unwrap();
        assert!(page.meetings.is_empty());
    }

    #[test]
    fn test_lookback_window_clamps_leap_day() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let window = RecordingWindow::lookback(today, 12);
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
        assert_eq!(window.query(), vec![("from", "2023-02-28".to_string())]);
    }

    #[test]
    fn test_window_query_includes_to() {
        let window = RecordingWindow {
            from: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2023, 6, 30),
        };
        assert_eq!(
            window.query(),
            vec![
                ("from", "2023-01-01".to_string()),
                ("to", "2023-06-30".to_string())
            ]
        );
    }
}
