// src/scan/providers/result_page.rs
//! Search result page parsing, decoupled from the network fetch so markup
//! drift shows up as a failing fixture test rather than a silent empty scan.

use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Url;

/// One result link extracted from a search page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLink {
    pub url: String,
    pub title: String,
}

pub trait ResultPageParser: Send + Sync {
    fn parse(&self, html: &str) -> Vec<ResultLink>;
}

/// Parser for the DuckDuckGo HTML endpoint (`html.duckduckgo.com/html/`).
/// Picks `<a>` elements whose class list contains `result__a`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDuckGoHtmlParser;

const RESULT_LINK_CLASS: &str = "result__a";

fn re_anchor() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\s([^>]*)>(.*?)</a>").unwrap())
}

fn re_class() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bclass\s*=\s*"([^"]*)""#).unwrap())
}

fn re_href() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bhref\s*=\s*"([^"]*)""#).unwrap())
}

impl ResultPageParser for DuckDuckGoHtmlParser {
    fn parse(&self, html: &str) -> Vec<ResultLink> {
        let mut out = Vec::new();
        for caps in re_anchor().captures_iter(html) {
            let attrs = &caps[1];
            let is_result = re_class()
                .captures(attrs)
                .map(|c| c[1].split_whitespace().any(|cls| cls == RESULT_LINK_CLASS))
                .unwrap_or(false);
            if !is_result {
                continue;
            }
            let Some(href) = re_href().captures(attrs).map(|c| c[1].to_string()) else {
                continue;
            };
            let href = html_escape::decode_html_entities(&href).trim().to_string();
            if href.is_empty() {
                continue;
            }
            out.push(ResultLink {
                url: unwrap_redirect(&href),
                title: clean_title(&caps[2]),
            });
        }
        out
    }
}

/// DuckDuckGo wraps outbound links as `//duckduckgo.com/l/?uddg=<target>`.
/// Returns the decoded target, or the href unchanged when it is not a
/// resolvable redirect.
pub fn unwrap_redirect(href: &str) -> String {
    let Ok(base) = Url::parse("https://duckduckgo.com/") else {
        return href.to_string();
    };
    let Ok(url) = base.join(href) else {
        return href.to_string();
    };
    let is_ddg = url
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    if !is_ddg || url.path() != "/l/" {
        return href.to_string();
    }
    url.query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
        .filter(|target| target.starts_with("http://") || target.starts_with("https://"))
        .unwrap_or_else(|| href.to_string())
}

/// Strip inner tags, decode entities, collapse whitespace.
fn clean_title(raw: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let no_tags = re_tags.replace_all(raw, "");
    let decoded = html_escape::decode_html_entities(&no_tags);
    re_ws.replace_all(&decoded, " ").trim().to_string()
}
