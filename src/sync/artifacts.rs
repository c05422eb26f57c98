use crate::models::SubmissionRecord;

/// File extension used for unmapped languages.
pub const FALLBACK_EXTENSION: &str = "txt";

/// Maps a language label from the editor to a source file extension.
pub fn extension_for(language: &str) -> &'static str {
    match language.trim().to_lowercase().as_str() {
        "python" | "python3" => "py",
        "java" => "java",
        "cpp" | "c++" => "cpp",
        "javascript" => "js",
        "typescript" => "ts",
        "c" => "c",
        "c#" => "cs",
        "ruby" => "rb",
        "swift" => "swift",
        "go" => "go",
        "rust" => "rs",
        "scala" => "scala",
        "kotlin" => "kt",
        _ => FALLBACK_EXTENSION,
    }
}

pub fn description_path(record: &SubmissionRecord) -> String {
    format!("{}/README.md", record.slug)
}

pub fn solution_path(record: &SubmissionRecord) -> String {
    format!("{}/{}.{}", record.slug, record.slug, extension_for(&record.language))
}

pub fn description_message(record: &SubmissionRecord) -> String {
    format!("[{}] Add problem: {}", record.platform, record.slug)
}

pub fn solution_message(record: &SubmissionRecord) -> String {
    format!("[{}] Add solution for {}", record.platform, record.slug)
}

/// Link to the problem page; `problemUrl` is stored without a scheme.
pub fn problem_link(record: &SubmissionRecord) -> String {
    let url = record.problem_url.trim();
    if url.is_empty() {
        format!("https://leetcode.com/problems/{}/", record.slug)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// The description document: linked title, badges, then the problem statement.
pub fn render_readme(record: &SubmissionRecord) -> String {
    let platform_badge = format!(
        "![{platform}](https://img.shields.io/badge/{platform}-grey)",
        platform = record.platform
    );
    let difficulty_badge = format!(
        "![{difficulty}](https://img.shields.io/badge/{difficulty}-{color})",
        difficulty = record.difficulty,
        color = record.difficulty.badge_color()
    );

    format!(
        "# [{}]({})\n\n{} {}\n\n{}",
        record.title,
        problem_link(record),
        platform_badge,
        difficulty_badge,
        record.description
    )
    .trim()
    .to_string()
}
