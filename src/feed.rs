use std::io::Write;
use std::{fs, path::Path};

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use owo_colors::OwoColorize;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::openalex::Work;

const ALTERNATE_LINK: &str = "https://openalex.org";
const DEFAULT_PUB_DATE: &str = "2024-01-01";

/// Per-item view of a work as it goes into the feed.
struct FeedItem {
    title: String,
    link: String,
    description: String,
    /// RFC 2822; None when the work's publication date failed to parse.
    pub_date: Option<String>,
}

impl FeedItem {
    fn from_work(work: &Work) -> Self {
        let title = escape_angles(work.title.as_deref().unwrap_or("No title"));
        let link = link_for(work.doi.as_deref().unwrap_or(""));

        let authors = work
            .authorships
            .iter()
            .filter_map(|a| a.author.display_name.as_deref())
            .collect::<Vec<_>>()
            .join(", ");
        let abstract_text = work
            .abstract_text
            .as_deref()
            .unwrap_or("No abstract available");
        let description =
            format!("<b>Authors:</b> {authors}<br/><br/><b>Abstract:</b><br/>{abstract_text}");

        let raw_date = work.publication_date.as_deref().unwrap_or(DEFAULT_PUB_DATE);
        let pub_date = match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
            Ok(date) => {
                let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
                Some(midnight.to_rfc2822())
            }
            Err(e) => {
                eprintln!(
                    "{} skipping invalid pubDate for '{title}': {raw_date} ({e})",
                    "⚠".yellow()
                );
                None
            }
        };

        FeedItem {
            title,
            link,
            description,
            pub_date,
        }
    }
}

/// Replace only the angle brackets. Ampersands and quotes stay raw in the
/// item field; the XML writer escapes the whole field as text afterwards.
fn escape_angles(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

fn link_for(doi: &str) -> String {
    if doi.starts_with("http") {
        doi.to_string()
    } else if !doi.is_empty() {
        format!("https://doi.org/{doi}")
    } else {
        ALTERNATE_LINK.to_string()
    }
}

/// Write one RSS 2.0 document for `works`, in the given order.
///
/// An empty slice still produces a valid channel with zero items.
pub fn write_feed(title: &str, works: &[Work], path: &Path) -> anyhow::Result<()> {
    if works.is_empty() {
        eprintln!("{} no items to write for feed: {title}", "⚠".yellow());
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("feed.xml");

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", title)?;
    text_element(&mut writer, "link", ALTERNATE_LINK)?;

    let mut self_link = BytesStart::new("atom:link");
    let href = format!("{ALTERNATE_LINK}/feeds/{file_name}");
    self_link.push_attribute(("href", href.as_str()));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(self_link))?;

    text_element(
        &mut writer,
        "description",
        &format!("Literature feed generated from OpenAlex for: {title}"),
    )?;
    text_element(&mut writer, "language", "en")?;
    text_element(&mut writer, "lastBuildDate", &Utc::now().to_rfc2822())?;
    text_element(
        &mut writer,
        "generator",
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )?;

    for work in works {
        let item = FeedItem::from_work(work);
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &item.title)?;
        text_element(&mut writer, "link", &item.link)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&item.link)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "description", &item.description)?;
        if let Some(date) = &item.pub_date {
            text_element(&mut writer, "pubDate", date)?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    let mut buf = writer.into_inner();
    buf.push(b'\n');

    fs::write(path, &buf).with_context(|| format!("failed to write feed file {}", path.display()))
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(json: &str) -> Work {
        serde_json::from_str(json).expect("work")
    }

    #[test]
    fn title_escapes_angle_brackets_only() {
        assert_eq!(escape_angles("A <B> C"), "A &lt;B&gt; C");
        assert_eq!(escape_angles("Q&A \"quoted\""), "Q&A \"quoted\"");
    }

    #[test]
    fn escaping_leaves_bracket_free_titles_alone() {
        proptest::proptest!(|(s in "[A-Za-z0-9 &'\"._-]{0,64}")| {
            proptest::prop_assert_eq!(escape_angles(&s), s);
        })
    }

    #[test]
    fn link_prefers_http_doi_then_doi_org_then_homepage() {
        assert_eq!(
            link_for("https://doi.org/10.1/xyz"),
            "https://doi.org/10.1/xyz"
        );
        assert_eq!(link_for("10.1/xyz"), "https://doi.org/10.1/xyz");
        assert_eq!(link_for(""), "https://openalex.org");
    }

    #[test]
    fn bare_dois_always_gain_the_doi_org_prefix() {
        proptest::proptest!(|(suffix in "10\\.[0-9]{4}/[a-z0-9.-]{1,32}")| {
            proptest::prop_assert_eq!(link_for(&suffix), format!("https://doi.org/{suffix}"));
        })
    }

    #[test]
    fn item_defaults_title_abstract_and_date() {
        let item = FeedItem::from_work(&work("{}"));
        assert_eq!(item.title, "No title");
        assert_eq!(item.link, "https://openalex.org");
        assert!(item.description.contains("No abstract available"));
        // Absent publication date falls back to 2024-01-01, a Monday.
        assert_eq!(item.pub_date.as_deref(), Some("Mon, 1 Jan 2024 00:00:00 +0000"));
    }

    #[test]
    fn item_renders_rfc2822_utc_dates() {
        let item = FeedItem::from_work(&work(r#"{"publication_date": "2024-03-01"}"#));
        assert_eq!(item.pub_date.as_deref(), Some("Fri, 1 Mar 2024 00:00:00 +0000"));
    }

    #[test]
    fn unparseable_date_drops_only_the_date() {
        let item = FeedItem::from_work(&work(
            r#"{"title": "t", "publication_date": "not-a-date"}"#,
        ));
        assert_eq!(item.pub_date, None);
        assert_eq!(item.title, "t");
    }

    #[test]
    fn authors_are_comma_joined_in_the_description() {
        let item = FeedItem::from_work(&work(
            r#"{"authorships": [
                {"author": {"display_name": "Jane Doe"}},
                {"author": {"display_name": "John Roe"}}
            ], "abstract": "Findings."}"#,
        ));
        assert_eq!(
            item.description,
            "<b>Authors:</b> Jane Doe, John Roe<br/><br/><b>Abstract:</b><br/>Findings."
        );
    }

    #[test]
    fn empty_feed_is_still_a_valid_channel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.xml");
        write_feed("empty", &[], &path).expect("write");
        let xml = fs::read_to_string(&path).expect("read back");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("<title>empty</title>"));
        assert!(xml.contains("https://openalex.org/feeds/empty.xml"));
        assert!(!xml.contains("<item>"));
        // Reader side sanity: the document parses without errors.
        let mut reader = quick_xml::Reader::from_str(&xml);
        let mut seen = Vec::new();
        loop {
            match reader.read_event().expect("well-formed xml") {
                quick_xml::events::Event::Eof => break,
                quick_xml::events::Event::Start(e) => {
                    seen.push(String::from_utf8_lossy(e.name().as_ref()).into_owned())
                }
                _ => {}
            }
        }
        assert!(seen.contains(&"channel".to_string()));
    }

    #[test]
    fn items_keep_their_given_order() {
        let works = vec![
            work(r#"{"title": "first", "publication_date": "2024-03-01"}"#),
            work(r#"{"title": "second", "publication_date": "2023-05-10"}"#),
        ];
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ordered.xml");
        write_feed("ordered", &works, &path).expect("write");
        let xml = fs::read_to_string(&path).expect("read back");
        let first = xml.find("first").expect("first item");
        let second = xml.find("second").expect("second item");
        assert!(first < second);
    }
}
