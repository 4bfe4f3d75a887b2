// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Catalog rendering.
//!
//! Turn a collection of video records back into the literal array assignment
//! that the UI expects. Field order per entry is fixed for each collection so
//! that regenerated output stays stable and diffs stay small:
//!
//! - `projects`: title, category, videoUrl, embedId, thumbnail, platform.
//! - `reels`: title, videoUrl, embedId, platform, thumbnail.
//!
//! The thumbnail is always written as a back-quoted template literal, every
//! other field as a double-quoted string literal.

use crate::catalog::record::{Collection, VideoRecord};

use std::fmt::Write;

const ENTRY_INDENT: &str = "  ";
const FIELD_INDENT: &str = "    ";

/// Render literal array assignment for target collection.
///
/// An empty collection renders as `const <name> = [];`.
pub fn render_collection(collection: Collection, records: &[VideoRecord]) -> String {
    let name = collection.name();
    if records.is_empty() {
        return format!("const {name} = [];");
    }

    let mut out = format!("const {name} = [\n");
    for record in records {
        out.push_str(ENTRY_INDENT);
        out.push_str("{\n");
        match collection {
            Collection::Projects => {
                quoted_field(&mut out, "title", &record.title);
                quoted_field(&mut out, "category", record.category.as_deref().unwrap_or_default());
                quoted_field(&mut out, "videoUrl", &record.video_url);
                quoted_field(&mut out, "embedId", &record.embed_id);
                template_field(&mut out, "thumbnail", &record.thumbnail);
                quoted_field(&mut out, "platform", &record.platform);
            }
            Collection::Reels => {
                quoted_field(&mut out, "title", &record.title);
                quoted_field(&mut out, "videoUrl", &record.video_url);
                quoted_field(&mut out, "embedId", &record.embed_id);
                quoted_field(&mut out, "platform", &record.platform);
                template_field(&mut out, "thumbnail", &record.thumbnail);
            }
        }
        out.push_str(ENTRY_INDENT);
        out.push_str("},\n");
    }
    out.push_str("];");

    out
}

fn quoted_field(out: &mut String, key: &str, value: &str) {
    // INVARIANT: Writing into a String never fails.
    let _ = writeln!(out, "{FIELD_INDENT}{key}: \"{}\",", escape_quoted(value));
}

fn template_field(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{FIELD_INDENT}{key}: `{}`,", escape_template(value));
}

/// Escape text for a double-quoted string literal.
pub fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }

    out
}

/// Escape text for a back-quoted template literal.
///
/// A `$` that would open an interpolation is escaped too, so the literal
/// always reads back as plain text.
pub fn escape_template(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse::parse_collection;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn project(title: &str, category: &str, embed_id: &str) -> VideoRecord {
        VideoRecord::new(
            Collection::Projects,
            title,
            format!("https://streamable.com/{embed_id}"),
            embed_id,
            None,
            Some(category.into()),
        )
    }

    fn reel(title: &str, embed_id: &str) -> VideoRecord {
        VideoRecord::new(
            Collection::Reels,
            title,
            format!("https://streamable.com/{embed_id}"),
            embed_id,
            None,
            None,
        )
    }

    #[test]
    fn render_projects_field_order() {
        let result = render_collection(
            Collection::Projects,
            &[project("PVE for personal brand", "Spec Work", "ct2sog")],
        );
        let expect = indoc! {r#"
            const projects = [
              {
                title: "PVE for personal brand",
                category: "Spec Work",
                videoUrl: "https://streamable.com/ct2sog",
                embedId: "ct2sog",
                thumbnail: `https://cdn-cf-east.streamable.com/image/ct2sog.jpg`,
                platform: "streamable",
              },
            ];"#};
        assert_eq!(result, expect);
    }

    #[test]
    fn render_reels_field_order() {
        let result = render_collection(
            Collection::Reels,
            &[reel("Football Highlight Reel", "l06h1d"), reel("Short Form Edit", "3ib9ax")],
        );
        let expect = indoc! {r#"
            const reels = [
              {
                title: "Football Highlight Reel",
                videoUrl: "https://streamable.com/l06h1d",
                embedId: "l06h1d",
                platform: "streamable",
                thumbnail: `https://cdn-cf-east.streamable.com/image/l06h1d.jpg`,
              },
              {
                title: "Short Form Edit",
                videoUrl: "https://streamable.com/3ib9ax",
                embedId: "3ib9ax",
                platform: "streamable",
                thumbnail: `https://cdn-cf-east.streamable.com/image/3ib9ax.jpg`,
              },
            ];"#};
        assert_eq!(result, expect);
    }

    #[test]
    fn render_empty_collection() {
        assert_eq!(render_collection(Collection::Reels, &[]), "const reels = [];");
        assert_eq!(
            render_collection(Collection::Projects, &[]),
            "const projects = [];"
        );
    }

    #[test]
    fn escape_string_literals() {
        assert_eq!(
            escape_quoted("say \"hi\"\\\nbye"),
            r#"say \"hi\"\\\nbye"#
        );
        assert_eq!(escape_template("a`b\\c\n${d} $e"), r"a\`b\\c\n\${d} $e");
    }

    #[test]
    fn parse_inverts_render() -> anyhow::Result<()> {
        let mut tricky = project("Quote \" tick ` dollar ${x} slash \\", "Multi\nLine", "q9");
        tricky.thumbnail = "https://img.example/${id}`\r\n.jpg".into();
        let projects = vec![
            project("PVE for personal brand", "Spec Work", "ct2sog"),
            tricky,
            project("Émoji 🎬 title", "Cinematic Edit", "z4gi5a"),
        ];
        let reels = vec![reel("Football Highlight Reel", "l06h1d"), reel("'Single'", "3ib9ax")];

        for (collection, records) in [
            (Collection::Projects, projects),
            (Collection::Reels, reels),
            (Collection::Reels, Vec::new()),
        ] {
            let text = render_collection(collection, &records);
            let parsed = parse_collection(&text, collection)?;
            assert_eq!(parsed.records, records);
            assert_eq!(parsed.span, 0..text.len());
        }

        Ok(())
    }
}
