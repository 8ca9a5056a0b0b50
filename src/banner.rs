//! Startup banner and run summary.

use std::path::Path;

use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};
use crate::generator::TokenUsage;

/// What `quill serve` is about to do.
pub struct BannerInfo<'a> {
    pub public_url: &'a str,
    pub model: &'a str,
    pub auth_status: &'a str,
    pub uploads: &'a str,
    pub blob_dir: &'a Path,
}

pub fn print_banner(info: &BannerInfo) {
    eprintln!(
        r#"
   ┌───────────────────────────────────────┐
   │              Q U I L L                │
   │     read the brief, plan, then write  │
   └───────────────────────────────────────┘

   version   {}
   by        {}
   home      {}
   repo      {}
   serving   {}
   model     {}
   auth      {}
   uploads   {}
   blobs     {}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.public_url,
        info.model,
        info.auth_status,
        info.uploads,
        info.blob_dir.display(),
    );
}

/// Token line printed after `quill run`. Nothing when no tokens were reported.
pub fn usage_line(usage: TokenUsage) -> Option<String> {
    (usage.total() > 0).then(|| {
        format!(
            "usage: {:>6} input + {:>6} output = {:>6} tokens",
            format_number(usage.input_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        )
    })
}

pub fn print_session_summary(usage: TokenUsage) {
    if let Some(line) = usage_line(usage) {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn print_banner_does_not_panic() {
        print_banner(&BannerInfo {
            public_url: "http://127.0.0.1:3000",
            model: "gpt-4o",
            auth_status: "not configured",
            uploads: "disabled",
            blob_dir: &PathBuf::from("/tmp/blobs"),
        });
    }

    #[test]
    fn usage_line_formats_thousands() {
        let line = usage_line(TokenUsage {
            input_tokens: 12_345,
            output_tokens: 678,
        })
        .unwrap();
        assert!(line.contains("12,345"));
        assert!(line.contains("13,023"));
    }

    #[test]
    fn usage_line_absent_without_tokens() {
        assert_eq!(usage_line(TokenUsage::default()), None);
    }
}
