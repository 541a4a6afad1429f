// file: src/models/language.rs
// description: canonical language names and file extensions for declared code tags

pub const BASH: &str = "bash";
pub const C: &str = "c";
pub const CPP: &str = "cpp";
pub const CSHARP: &str = "csharp";
pub const GO: &str = "go";
pub const JAVA: &str = "java";
pub const JAVASCRIPT: &str = "javascript";
pub const JSON: &str = "json";
pub const KOTLIN: &str = "kotlin";
pub const PHP: &str = "php";
pub const PYTHON: &str = "python";
pub const RUBY: &str = "ruby";
pub const RUST: &str = "rust";
pub const SCALA: &str = "scala";
pub const SHELL: &str = "shell";
pub const SWIFT: &str = "swift";
pub const TEXT: &str = "text";
pub const TYPESCRIPT: &str = "typescript";
pub const UNDEFINED: &str = "undefined";
pub const XML: &str = "xml";
pub const YAML: &str = "yaml";

/// Maps a declared language tag to its canonical name. Unknown tags are `undefined`.
pub fn normalize_language(tag: &str) -> &'static str {
    match tag.trim() {
        BASH => BASH,
        C => C,
        CPP => CPP,
        CSHARP | "cs" => CSHARP,
        GO | "golang" => GO,
        JAVA => JAVA,
        JAVASCRIPT | "js" => JAVASCRIPT,
        JSON | "json\\n :copyable: false" | "json\\n :copyable: true" => JSON,
        KOTLIN => KOTLIN,
        PHP => PHP,
        PYTHON => PYTHON,
        RUBY => RUBY,
        RUST => RUST,
        SCALA => SCALA,
        SHELL | "console" | "sh" => SHELL,
        SWIFT => SWIFT,
        TEXT | "http" | "ini" => TEXT,
        TYPESCRIPT => TYPESCRIPT,
        XML => XML,
        YAML => YAML,
        _ => UNDEFINED,
    }
}

pub fn file_extension(tag: &str) -> &'static str {
    match normalize_language(tag) {
        BASH | SHELL => ".sh",
        C => ".c",
        CPP => ".cpp",
        CSHARP => ".cs",
        GO => ".go",
        JAVA => ".java",
        JAVASCRIPT => ".js",
        JSON => ".json",
        KOTLIN => ".kt",
        PHP => ".php",
        PYTHON => ".py",
        RUBY => ".rb",
        RUST => ".rs",
        SCALA => ".scala",
        SWIFT => ".swift",
        TYPESCRIPT => ".ts",
        XML => ".xml",
        YAML => ".yaml",
        _ => ".txt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalize() {
        assert_eq!(normalize_language("console"), SHELL);
        assert_eq!(normalize_language("sh"), SHELL);
        assert_eq!(normalize_language("cs"), CSHARP);
        assert_eq!(normalize_language("golang"), GO);
        assert_eq!(normalize_language("js"), JAVASCRIPT);
        assert_eq!(normalize_language("ini"), TEXT);
        assert_eq!(normalize_language(""), UNDEFINED);
        assert_eq!(normalize_language("none"), UNDEFINED);
        assert_eq!(normalize_language("brainfuck"), UNDEFINED);
    }

    #[test]
    fn test_extensions_follow_canonical_language() {
        assert_eq!(file_extension("python"), ".py");
        assert_eq!(file_extension("console"), ".sh");
        assert_eq!(file_extension("cs"), ".cs");
        assert_eq!(file_extension("http"), ".txt");
        assert_eq!(file_extension(""), ".txt");
    }
}
