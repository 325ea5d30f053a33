//! Caption text posted ahead of each relayed video.

use chrono::NaiveDate;

use crate::remote::VideoMetadata;

/// Build the labelled caption for the link at `index`.
///
/// Fields the source did not report are rendered as `unknown` so the layout
/// stays the same for every post.
pub fn compose(index: usize, metadata: &VideoMetadata) -> String {
    let likes = metadata
        .likes
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let uploaded = metadata
        .upload_date
        .as_deref()
        .map(format_upload_date)
        .unwrap_or_else(|| "unknown".to_string());
    let thumbnail = metadata.thumbnail_url.as_deref().unwrap_or("none");

    let fields = [
        ("Title", metadata.title.clone()),
        ("Likes", likes),
        ("Duration", format_duration(metadata.duration_seconds)),
        ("Uploaded At", uploaded),
        ("Video URL", metadata.canonical_url.clone()),
        ("Thumbnail URL", thumbnail.to_string()),
        ("Description", metadata.description.clone()),
    ];

    let mut caption = format!("#{index}");
    for (label, value) in fields {
        caption.push_str(&format!("\n{label}:\n{value}"));
    }
    caption
}

/// `YYYYMMDD` as `YYYY-MM-DD`; anything else is passed through.
fn format_upload_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}s ({:02}:{:02}:{:02})", seconds, hours, mins, secs)
}
