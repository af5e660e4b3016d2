//! Plain-text rendering of profiles, posts and rosters for the terminal.

use chrono::{DateTime, Utc};
use classroom_core::domain::{Post, UserProfile};
use classroom_core::feed::{format_relative, is_liked_by, is_own_comment, is_own_post, CommentExpansion};

fn yours(owned: bool) -> &'static str {
    if owned {
        " (yours)"
    } else {
        ""
    }
}

pub fn profile(user: &UserProfile) -> String {
    let confirmed = if user.confirmed { "yes" } else { "no" };
    let mut out = format!(
        "{} <{}>\n  id:        {}\n  role:      {}\n  confirmed: {confirmed}\n",
        user.display_name(),
        user.email,
        user.id,
        user.role,
    );
    if let Some(education) = &user.education {
        out.push_str(&format!("  major:     {}\n", education.major));
        if let Some(student_id) = &education.student_id {
            out.push_str(&format!("  student:   {student_id}\n"));
        }
        if let Some(year) = &education.enrollment_year {
            out.push_str(&format!("  enrolled:  {year}\n"));
        }
    }
    out
}

pub fn post(
    post: &Post,
    viewer: &UserProfile,
    expansion: &CommentExpansion,
    now: DateTime<Utc>,
) -> String {
    let mut out = format!(
        "[{}] {} · {}{}\n",
        post.id,
        post.created_by.display_name(),
        format_relative(post.created_at, now),
        yours(is_own_post(post, viewer)),
    );
    for line in post.content.lines() {
        out.push_str(&format!("  {line}\n"));
    }

    let liked = if is_liked_by(post, viewer) { ", including you" } else { "" };
    out.push_str(&format!(
        "  {} like(s){liked} · {} comment(s)\n",
        post.likes.len(),
        post.comments.len()
    ));

    for comment in expansion.visible_comments(post) {
        out.push_str(&format!(
            "    - [{}] {} · {}{}: {}\n",
            comment.id,
            comment.created_by.display_name(),
            format_relative(comment.created_at, now),
            yours(is_own_comment(comment, viewer)),
            comment.content
        ));
    }
    let hidden = expansion.hidden_count(post);
    if hidden > 0 {
        out.push_str(&format!(
            "    … {hidden} more (classroom posts --expand {})\n",
            post.id
        ));
    }
    out
}

pub fn feed(
    posts: &[Post],
    viewer: &UserProfile,
    expansion: &CommentExpansion,
    now: DateTime<Utc>,
) -> String {
    if posts.is_empty() {
        return "No posts yet.\n".to_string();
    }
    posts
        .iter()
        .map(|p| post(p, viewer, expansion, now))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn students(year: &str, students: &[UserProfile]) -> String {
    if students.is_empty() {
        return format!("No students enrolled in {year}.\n");
    }
    let rows = students.iter().map(|student| {
        let education = student.education.as_ref();
        let student_id = education
            .and_then(|e| e.student_id.as_deref())
            .unwrap_or("-");
        let major = education.map(|e| e.major.as_str()).unwrap_or("-");
        format!(
            "  {:<14} {:<30} {:<32} {}\n",
            student_id,
            student.display_name(),
            student.email,
            major
        )
    });
    let mut out = format!("{} student(s) enrolled in {year}\n", students.len());
    out.extend(rows);
    out
}
