//! Language detection and separator priority lists.
//!
//! The file extension picks a language tag plus a separator class. The class
//! drives the recursive splitter: earlier separators are structurally
//! stronger (function/class boundaries), later ones are progressively
//! weaker (blank line, line, word, character).

/// Separator family used by the recursive splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorClass {
    Rust,
    Python,
    Go,
    CFamily,
    Markdown,
    Html,
    Plain,
}

/// Detected language for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Tag stored on chunks (e.g. `"rust"`, `"typescript"`).
    pub tag: &'static str,
    /// Separator family used to split the file.
    pub class: SeparatorClass,
}

impl SeparatorClass {
    /// Priority-ordered separators for this class. The empty separator is
    /// always last and splits at character granularity.
    #[must_use]
    pub const fn separators(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &[
                "\nfn ", "\npub fn ", "\nimpl ", "\nstruct ", "\nenum ", "\ntrait ", "\nmod ",
                "\nconst ", "\nstatic ", "\nmatch ", "\nif ", "\nwhile ", "\nfor ", "\nloop ",
                "\n\n", "\n", " ", "",
            ],
            Self::Python => &[
                "\nclass ", "\ndef ", "\n\tdef ", "\n    def ", "\n\n", "\n", " ", "",
            ],
            Self::Go => &[
                "\nfunc ", "\ntype ", "\nvar ", "\nconst ", "\nif ", "\nfor ", "\nswitch ",
                "\ncase ", "\n\n", "\n", " ", "",
            ],
            Self::CFamily => &[
                "\nclass ", "\ninterface ", "\nnamespace ", "\npublic ", "\nprotected ",
                "\nprivate ", "\nstatic ", "\nfunction ", "\nvoid ", "\nint ", "\nif ", "\nfor ",
                "\nwhile ", "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
            ],
            Self::Markdown => &[
                "\n# ", "\n## ", "\n### ", "\n#### ", "\n##### ", "\n###### ", "\n```\n",
                "\n\n---\n\n", "\n\n***\n\n", "\n\n", "\n", " ", "",
            ],
            Self::Html => &[
                "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6",
                "<table", "<tr", "<td", "<section", "<article", "\n\n", "\n", " ", "",
            ],
            Self::Plain => &["\n\n", "\n", " ", ""],
        }
    }
}

/// Extensions treated as plain text by default, beyond the code table.
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "rst", "adoc", "org", "log", "cfg", "conf", "ini", "env",
];

/// Detect the language of a file from its path extension.
///
/// Unknown extensions that appear in `text_extensions` (or the built-in
/// text set) are treated as plain text; any other extension is unsupported
/// and the file should be skipped.
#[must_use]
pub fn detect_language(path: &str, text_extensions: &[String]) -> Option<LanguageInfo> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)?;

    let info = |tag, class| LanguageInfo { tag, class };
    let detected = match ext.as_str() {
        "rs" => info("rust", SeparatorClass::Rust),
        "py" | "pyi" => info("python", SeparatorClass::Python),
        "rb" | "rake" => info("ruby", SeparatorClass::Python),
        "go" => info("go", SeparatorClass::Go),
        "c" | "h" => info("c", SeparatorClass::CFamily),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => info("cpp", SeparatorClass::CFamily),
        "java" => info("java", SeparatorClass::CFamily),
        "js" | "jsx" | "mjs" | "cjs" => info("javascript", SeparatorClass::CFamily),
        "ts" | "tsx" | "mts" => info("typescript", SeparatorClass::CFamily),
        "cs" => info("csharp", SeparatorClass::CFamily),
        "swift" => info("swift", SeparatorClass::CFamily),
        "kt" | "kts" => info("kotlin", SeparatorClass::CFamily),
        "scala" => info("scala", SeparatorClass::CFamily),
        "php" => info("php", SeparatorClass::CFamily),
        "md" | "markdown" | "mdx" => info("markdown", SeparatorClass::Markdown),
        "html" | "htm" => info("html", SeparatorClass::Html),
        "json" => info("json", SeparatorClass::Plain),
        "yaml" | "yml" => info("yaml", SeparatorClass::Plain),
        "toml" => info("toml", SeparatorClass::Plain),
        "xml" => info("xml", SeparatorClass::Plain),
        "css" | "scss" | "less" => info("css", SeparatorClass::Plain),
        "sh" | "bash" | "zsh" => info("shell", SeparatorClass::Plain),
        "sql" => info("sql", SeparatorClass::Plain),
        other => {
            let is_text = DEFAULT_TEXT_EXTENSIONS.contains(&other)
                || text_extensions.iter().any(|t| t == other);
            if is_text {
                info("text", SeparatorClass::Plain)
            } else {
                return None;
            }
        }
    };
    Some(detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("src/lib.rs", "rust")]
    #[case("app/main.py", "python")]
    #[case("cmd/main.go", "go")]
    #[case("src/index.ts", "typescript")]
    #[case("README.md", "markdown")]
    #[case("notes.txt", "text")]
    #[case("config.yaml", "yaml")]
    fn detects_known_extensions(#[case] path: &str, #[case] tag: &str) {
        let info = detect_language(path, &[]).expect("should detect");
        assert_eq!(info.tag, tag);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(detect_language("model.onnx", &[]).is_none());
        assert!(detect_language("binary.bin", &[]).is_none());
    }

    #[test]
    fn configured_text_extension_is_plain_text() {
        let exts = vec!["wiki".to_string()];
        let info = detect_language("page.wiki", &exts).expect("configured text ext");
        assert_eq!(info.tag, "text");
        assert_eq!(info.class, SeparatorClass::Plain);
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(detect_language("MAIN.RS", &[]).unwrap().tag, "rust");
    }

    #[test]
    fn no_extension_is_unsupported() {
        assert!(detect_language("Makefile", &[]).is_none());
    }

    #[test]
    fn every_class_ends_with_char_separator() {
        for class in [
            SeparatorClass::Rust,
            SeparatorClass::Python,
            SeparatorClass::Go,
            SeparatorClass::CFamily,
            SeparatorClass::Markdown,
            SeparatorClass::Html,
            SeparatorClass::Plain,
        ] {
            assert_eq!(*class.separators().last().unwrap(), "");
        }
    }
}
