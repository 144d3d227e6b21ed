//! Prompt construction for analysis and chat calls.

use resumelens_core::{CanonicalRecord, JobContext};
use serde::{Deserialize, Serialize};

const ANALYSIS_TEMPLATE: &str = r#"You are a strategic resume optimization expert, skilled in both Applicant Tracking Systems (ATS) and human recruiter perspectives. Your goal is to analyze a resume for a {JOB_TITLE} position at {COMPANY} and provide feedback that maximizes its chances of success with both ATS and human reviewers.

Required experience level: {JOB_LEVEL}

Job Description:
{JOB_DESCRIPTION}

Provide a detailed analysis in JSON format with:

1. Scoring (based on concrete ATS metrics):
- originalScore: 0-100 (calculated based on:
      - Keyword Match (50% weight): Exact and related keyword presence and density from job description.
      - Format Compliance (30% weight): Adherence to ATS-friendly formatting (section headers, bullet points, file type, etc.).
      - Content Relevance & Impact (20% weight): Relevance of experience to job duties and quantifiable achievements mentioned in resume sections.)
- optimizedScore: 0-100 (projected score after implementing all suggestions)

2. Section-by-Section Analysis:
- sectionFeedback: [{
  section: string (e.g., "Professional Experience", "Skills", etc.)
  matches: string[] (list of strong matches with job requirements)
  misses: string[] (list of missing or weak elements)
  suggestions: string (including suggestions to add quantifiable achievements and stronger action verbs)
  sources: string[] (explanation of ATS principle or best practice behind the suggestion)
}]

3. Skills Gap Analysis:
- missingSkills: [{
    skill: string
    category: "Technical" | "Soft Skill" | "Industry Specific" | "Other"
    priority: "High" | "Medium" | "Low" (based on job description emphasis)
    reason: string (why this skill is important for the job)
  }]

4. Career Trajectory:
- careerPaths: [{
  title: string (specific role title)
  description: string (role overview and alignment with candidate's background)
  requiredSkills: string[] (key skills needed)
  potentialEmployers: string[] (companies known for these roles)
}]

5. Optimized Content:
- optimizedResume: string (complete resume text with all improvements applied)
- highlights: [{
  type: "removed" | "modified" | "retained"
  content: string (exact text from the optimized resume)
  reason: string (specific reason for change/approval)
  requirement: string (related job requirement)
  impact: string (how this affects ATS scoring)
  recommendations?: string (specific improvement suggestions)
}]

Format requirements:
- Use Markdown for optimizedResume with proper headers (##), bullet points (*), and sections
- Escape special characters properly
- Maintain consistent JSON structure
- Include concrete examples from the resume
- Reference specific job requirements in suggestions"#;

/// One earlier message of a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Analysis prompt for `job` with the résumé text appended.
pub fn analysis_prompt(job: &JobContext, source_text: &str) -> String {
    let instructions = ANALYSIS_TEMPLATE
        .replace("{JOB_TITLE}", &job.title)
        .replace("{JOB_LEVEL}", &job.level)
        .replace("{COMPANY}", &job.company)
        .replace("{JOB_DESCRIPTION}", &job.description);
    format!("{instructions}\n\nResume Content:\n{source_text}")
}

/// Chat prompt grounding a follow-up question in an existing analysis.
pub fn chat_prompt(record: &CanonicalRecord, history: &[ChatMessage], message: &str) -> String {
    let mut out = String::from(
        "You are an expert resume consultant with deep knowledge of ATS systems and hiring \
         practices. You have analyzed this resume and provided feedback. Here's the context:\n\n",
    );
    out.push_str(&format!("Original Score: {}\n", record.original_score));
    out.push_str(&format!("Optimized Score: {}\n\n", record.optimized_score));

    out.push_str("Section Feedback:\n");
    for section in &record.section_feedback {
        out.push_str(&format!(
            "\n{}:\n- Strengths: {}\n- Areas for Improvement: {}\n- Suggestions: {}\n",
            section.section,
            section.matches.join(", "),
            section.misses.join(", "),
            section.suggestions,
        ));
    }

    let skills: Vec<&str> = record.missing_skills.iter().map(|s| s.skill.as_str()).collect();
    out.push_str(&format!("\nMissing Skills:\n{}\n\n", skills.join(", ")));

    out.push_str("Previous conversation context:\n");
    for msg in history {
        out.push_str(&format!("{}: {}\n", msg.role, msg.content));
    }

    out.push_str(&format!("\nCurrent user message: {message}\n\n"));
    out.push_str(
        "Provide a helpful, specific response that:\n\
         1. Directly addresses the user's question\n\
         2. References relevant parts of the analysis\n\
         3. Gives actionable, specific advice\n\
         4. Uses a professional but friendly tone\n\
         5. Keeps responses concise but informative\n\
         6. Includes specific examples where appropriate\n\n\
         Remember to:\n\
         - Stay focused on resume improvement\n\
         - Provide evidence-based recommendations\n\
         - Be encouraging while honest\n\
         - Suggest specific changes when relevant",
    );
    out
}
