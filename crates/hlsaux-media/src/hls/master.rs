//! Announcing I-frame playlists in a master playlist.

const IFRAME_STREAM_INF: &str = "#EXT-X-I-FRAME-STREAM-INF:";

/// Append `#EXT-X-I-FRAME-STREAM-INF` lines to master playlist text.
///
/// `streams` holds `(uri, line)` pairs. Existing I-frame stream lines that
/// point at one of those URIs are dropped first, so rewriting a master
/// with the same streams again yields the same text. Everything else is
/// kept verbatim.
pub fn rewrite_master(master: &str, streams: &[(String, String)]) -> String {
    let mut out = String::with_capacity(master.len() + streams.len() * 96);

    for line in master.lines() {
        let replaced = iframe_uri(line)
            .map(|uri| streams.iter().any(|(u, _)| u == uri))
            .unwrap_or(false);
        if !replaced {
            out.push_str(line);
            out.push('\n');
        }
    }

    for (_, line) in streams {
        out.push_str(line);
        out.push('\n');
    }

    out
}

/// The `URI` attribute of an I-frame stream line.
fn iframe_uri(line: &str) -> Option<&str> {
    let attrs = line.trim_end().strip_prefix(IFRAME_STREAM_INF)?;
    let start = attrs.find("URI=\"")? + 5;
    let len = attrs[start..].find('"')?;
    Some(&attrs[start..start + len])
}
