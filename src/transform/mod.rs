//! Code transformation
//!
//! Minification for both bundle kinds and `url()` rewriting for stylesheets.

use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use once_cell::sync::Lazy;
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::{Captures, Regex};

use crate::bundler::BundleKind;
use crate::error::{OrganizerError, Result};
use crate::utils::{clean_path, relative_path};

/// `url(...)` references inside a stylesheet, quoted or bare
static CSS_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'"\s)]+))\s*\)"#).unwrap()
});

/// Minify a script with oxc.
///
/// Sources are parsed as classic scripts so top-level declarations stay
/// global and are neither dropped nor renamed.
pub fn minify_script(code: &str) -> Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(OrganizerError::Minify {
            kind: BundleKind::Script,
            message,
        });
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let output = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program);

    Ok(output.code)
}

/// Minify a stylesheet with lightningcss
pub fn minify_style(code: &str) -> Result<String> {
    let minify_error = |message: String| OrganizerError::Minify {
        kind: BundleKind::Style,
        message,
    };

    let stylesheet = StyleSheet::parse(code, ParserOptions::default())
        .map_err(|e| minify_error(e.to_string()))?;
    let output = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| minify_error(e.to_string()))?;

    Ok(output.code)
}

/// Rewrite relative `url()` references so they resolve under `public_path`.
///
/// `source_dir` is the directory the stylesheet was read from and `base_path`
/// the configured style base path; the difference between the two is kept.
pub fn rewrite_css_urls(code: &str, source_dir: &Path, base_path: &Path, public_path: &str) -> String {
    let subdir = relative_path(base_path, source_dir).unwrap_or_default();
    let prefix = public_path.trim_end_matches('/');

    CSS_URL_REGEX
        .replace_all(code, |caps: &Captures| {
            let (reference, quote) = if let Some(m) = caps.get(1) {
                (m.as_str(), "\"")
            } else if let Some(m) = caps.get(2) {
                (m.as_str(), "'")
            } else {
                (caps.get(3).map_or("", |m| m.as_str()), "")
            };

            if !is_relative_reference(reference) {
                return caps[0].to_string();
            }

            let joined = if subdir.is_empty() {
                format!("{}/{}", prefix, reference)
            } else {
                format!("{}/{}/{}", prefix, subdir.replace('\\', "/"), reference)
            };
            let rewritten = if prefix.contains("://") {
                // Keep the scheme's double slash intact
                let (scheme, rest) = joined.split_once("://").unwrap_or(("", joined.as_str()));
                format!("{}://{}", scheme, clean_path(rest).trim_start_matches('/'))
            } else {
                clean_path(&joined)
            };

            format!("url({quote}{rewritten}{quote})")
        })
        .into_owned()
}

fn is_relative_reference(reference: &str) -> bool {
    !(reference.is_empty()
        || reference.starts_with('/')
        || reference.starts_with('#')
        || reference.starts_with("data:")
        || reference.contains("://"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parses_as_script(code: &str) -> bool {
        let allocator = Allocator::default();
        Parser::new(&allocator, code, SourceType::cjs())
            .parse()
            .errors
            .is_empty()
    }

    #[test]
    fn test_minify_script_strips_comments() {
        let code = "// header\nvar a = 1;   /* block */ var b = 2;\n\n\nfoo( a,  b );";
        let result = minify_script(code).unwrap();

        assert!(!result.contains("header"));
        assert!(!result.contains("block"));
        assert!(result.contains("foo("));
        assert!(parses_as_script(&result));
    }

    #[test]
    fn test_minify_script_keeps_strings() {
        let code = r#"var s = "a  // not a comment"; var t = 'it\'s  /* kept */';"#;
        let result = minify_script(code).unwrap();

        assert!(result.contains("a  // not a comment"));
        assert!(result.contains("it's  /* kept */"));
        assert!(parses_as_script(&result));
    }

    #[test]
    fn test_minify_script_keeps_regex_literals() {
        let code = "var re = /https?:\\/\\//;\nvar ok = 1;";
        let result = minify_script(code).unwrap();

        assert!(result.contains(r"/https?:\/\//"), "regex lost: {result}");
        assert!(parses_as_script(&result), "invalid output: {result}");
    }

    #[test]
    fn test_minify_script_separates_tokens_around_comments() {
        let code = "function f(x) { return/**/x; }\nvar half = f(4) / 2;";
        let result = minify_script(code).unwrap();

        assert!(!result.contains("returnx"));
        assert!(parses_as_script(&result), "invalid output: {result}");
    }

    #[test]
    fn test_minify_script_rejects_invalid_source() {
        let err = minify_script("var = ;").unwrap_err();

        assert!(matches!(
            err,
            OrganizerError::Minify {
                kind: BundleKind::Script,
                ..
            }
        ));
    }

    #[test]
    fn test_minify_style() {
        let css = "body {\n  color: red;\n  margin: 0px;\n}\n";
        let result = minify_style(css).unwrap();

        assert_eq!(result, "body{color:red;margin:0}");
    }

    #[test]
    fn test_rewrite_css_urls() {
        let css = r#"a { background: url(img/bg.png); } b { src: url("../fonts/x.woff"); } c { background: url('/abs.png'); } d { background: url(data:image/png;base64,AAAA); }"#;
        let result = rewrite_css_urls(
            css,
            Path::new("/site/css/theme"),
            Path::new("/site/css"),
            "/static/css/",
        );

        assert!(result.contains("url(/static/css/theme/img/bg.png)"));
        assert!(result.contains(r#"url("/static/css/fonts/x.woff")"#));
        assert!(result.contains("url('/abs.png')"));
        assert!(result.contains("url(data:image/png;base64,AAAA)"));
    }

    #[test]
    fn test_rewrite_css_urls_with_absolute_public_url() {
        let css = "a { background: url(bg.png); }";
        let result = rewrite_css_urls(
            css,
            Path::new("/site/css"),
            Path::new("/site/css"),
            "https://cdn.example.com/css",
        );

        assert_eq!(result, "a { background: url(https://cdn.example.com/css/bg.png); }");
    }
}
