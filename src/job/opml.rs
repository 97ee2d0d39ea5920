//! OPML 2.0 export of a user's subscriptions.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::subscription::{Folder, SubscribedFeed};

/// Build the OPML document for a user's subscriptions.
///
/// Unfiled feeds are listed at the top level, followed by one outline per
/// non-empty folder holding its feeds.
pub fn build_opml(
    owner: &str,
    feeds: &[SubscribedFeed],
    folders: &[Folder],
    created: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<opml version=\"2.0\">\n");
    out.push_str("  <head>\n");
    let _ = writeln!(
        out,
        "    <title>{}</title>",
        escape_xml(&format!("Subscriptions of {owner}"))
    );
    let _ = writeln!(out, "    <dateCreated>{}</dateCreated>", created.to_rfc2822());
    out.push_str("  </head>\n");
    out.push_str("  <body>\n");

    for feed in feeds.iter().filter(|f| f.folder_id.is_none()) {
        write_feed(&mut out, feed, 4);
    }

    for folder in folders {
        let mut members = feeds
            .iter()
            .filter(|f| f.folder_id == Some(folder.id))
            .peekable();
        if members.peek().is_none() {
            continue;
        }
        let title = escape_xml(&folder.title);
        let _ = writeln!(out, "    <outline title=\"{title}\" text=\"{title}\">");
        for feed in members {
            write_feed(&mut out, feed, 6);
        }
        out.push_str("    </outline>\n");
    }

    out.push_str("  </body>\n");
    out.push_str("</opml>\n");
    out
}

fn write_feed(out: &mut String, feed: &SubscribedFeed, indent: usize) {
    let title = escape_xml(feed.feed.display_title());
    let _ = write!(
        out,
        "{:indent$}<outline type=\"rss\" title=\"{title}\" text=\"{title}\" xmlUrl=\"{}\"",
        "",
        escape_xml(&feed.feed.fetch_url),
    );
    if let Some(url) = &feed.feed.url {
        let _ = write!(out, " htmlUrl=\"{}\"", escape_xml(url));
    }
    out.push_str("/>\n");
}

/// Escape text for use in XML content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
