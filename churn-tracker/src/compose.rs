//! Text of the posts built from a [`CycleReport`].
use crate::orchestrator::CycleReport;
use churn_social::ResolvedUser;

pub const DEFAULT_HASHTAG: &str = "#真空bot";
pub const BLOCKED_NOTE: &str = "It looks I have been blocked by this user.";

/// Wrap a body as a post: mention line, body, hashtag line.
///
/// Without a screen name the first line is left empty.
pub fn signed(screen_name: Option<&str>, body: &str, hashtag: &str) -> String {
    let mention = screen_name.map(|s| format!("@{s}")).unwrap_or_default();
    format!("{mention}\n{body}\n{hashtag}")
}

pub fn intent_url(id: &str) -> String {
    format!("https://twitter.com/intent/user?user_id={id}")
}

pub fn status_body(report: &CycleReport) -> String {
    let c = &report.counts;
    let d = &report.deltas;
    format!(
        "Followers: {}({})\nFollowing: {}({})\nListed: {}({})\nLikes: {}({})\nPosts: {}({})\n{}",
        c.followers_count,
        d.followers,
        c.following_count,
        d.following,
        c.listed_count,
        d.listed,
        c.favourites_count,
        d.favourites,
        c.posts_count,
        d.posts,
        report.weather_text
    )
}

fn churn_body(heading: &str, id: &str, user: Option<&ResolvedUser>, blocked: bool) -> String {
    let mut text = format!("{heading} \n{}\nID: {id}", intent_url(id));
    if let Some(user) = user {
        if blocked {
            text.push('\n');
            text.push_str(BLOCKED_NOTE);
        }
        text.push_str(&format!(
            "\nScreen name: {}\nName: {}",
            user.screen_name, user.display_name
        ));
    }
    text
}

/// `blocked` only shows for resolved users.
pub fn unfollowed_body(id: &str, user: Option<&ResolvedUser>, blocked: bool) -> String {
    churn_body("Unfollowed by:", id, user, blocked)
}

pub fn followed_body(id: &str, user: Option<&ResolvedUser>) -> String {
    churn_body("Followed by:", id, user, false)
}
