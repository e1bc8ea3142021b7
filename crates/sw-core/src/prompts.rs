use crate::types::ReviewIssue;
use std::fmt::Write as _;
use std::path::Path;

/// Instruction set for the review pass. The agent runs in read-only mode, so
/// the prompt only asks it to read and report, never to edit.
pub fn build_review_prompt(project_path: &Path) -> String {
    format!(
        r#"You are a senior code reviewer. Analyze the recent code changes in the project at "{path}".

## Review Categories

1. **Security** - Vulnerabilities, injection risks, auth issues, exposed secrets
2. **Bug** - Logic errors, edge cases, null references, race conditions
3. **Architecture** - Design patterns, modularity, coupling, SOLID violations
4. **Performance** - N+1 queries, memory leaks, unnecessary computation, bundle size
5. **Quality** - Naming, readability, duplication, missing error handling

## Instructions

1. Read the recently modified files using the Read tool
2. Analyze the code for issues across all categories
3. Identify strengths and positive patterns
4. Provide actionable recommendations

## Output Format

You MUST respond with ONLY a valid JSON object (no markdown, no code fences, no explanation before/after). The JSON must follow this exact schema:

{{
  "summary": "Brief 1-2 sentence summary of the review",
  "overallScore": 85,
  "issues": [
    {{
      "severity": "critical|high|medium|low",
      "category": "security|bug|architecture|performance|quality",
      "title": "Short issue title",
      "description": "Detailed description of the issue",
      "file": "relative/path/to/file",
      "line": 42,
      "suggestion": "How to fix this issue",
      "autoFixable": true
    }}
  ],
  "strengths": [
    "Positive aspect of the code"
  ],
  "recommendations": [
    "Actionable recommendation for improvement"
  ]
}}

## Scoring Guide

- 90-100: Excellent - minimal or no issues
- 70-89: Good - minor issues only
- 50-69: Needs improvement - some significant issues
- 0-49: Critical - major issues requiring immediate attention

## Rules

- Be specific: reference actual file paths and line numbers
- Be constructive: always suggest how to fix issues
- Mark "autoFixable": true only for issues that can be fixed with simple, safe code changes
- Only mark critical/high severity for genuinely important issues
- If the code is well-written, say so - don't invent issues"#,
        path = project_path.display()
    )
}

/// Remediation instruction for the write-capable follow-up run: a numbered
/// list of findings and a directive to fix them with minimal changes.
pub fn build_auto_fix_prompt(issues: &[ReviewIssue]) -> String {
    let mut listing = String::new();
    for (index, issue) in issues.iter().enumerate() {
        if index > 0 {
            listing.push_str("\n\n");
        }
        let severity = serde_json::to_value(issue.severity)
            .ok()
            .and_then(|v| v.as_str().map(str::to_uppercase))
            .unwrap_or_default();
        let _ = write!(listing, "{}. [{severity}] {}", index + 1, issue.title);
        if let Some(file) = &issue.file {
            let _ = write!(listing, "\n   File: {file}");
            if let Some(line) = issue.line {
                let _ = write!(listing, ":{line}");
            }
        }
        let _ = write!(listing, "\n   {}", issue.description);
        if let Some(suggestion) = &issue.suggestion {
            let _ = write!(listing, "\n   Suggestion: {suggestion}");
        }
    }

    format!(
        r#"[Architect Review - Auto Fix Request]

The code review found the following critical/high severity issues that need to be fixed:

{listing}

Please fix ALL of the above issues. For each fix:
1. Read the relevant file
2. Apply the minimal necessary change
3. Do not introduce new features or refactor beyond what's needed"#
    )
}
