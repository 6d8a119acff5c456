//! Entities and the factories that create local posts and comments.
//!
//! Field names on the wire follow the DummyJSON API so that a snapshot written
//! locally and one assembled from the network are the same format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub user_id: u64,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default)]
    pub views: u64,
}

/// Identity of a commenter, copied at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUser {
    pub id: u64,
    pub full_name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub post_id: u64,
    #[serde(default)]
    pub likes: u64,
    pub user: CommentUser,
}

/// The users, posts and comments of one session, loaded and persisted as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
}

impl Dataset {
    pub fn find_user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn username(&self, id: u64) -> Option<&str> {
        self.find_user(id).map(|u| u.username.as_str())
    }

    pub fn find_post(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn find_post_mut(&mut self, id: u64) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    /// Comments attached to `post_id`, in insertion order.
    pub fn comments_for(&self, post_id: u64) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(move |c| c.post_id == post_id)
    }
}

/// `max + 1` over the given ids, or 1 for an empty collection. `None` once the
/// largest id is `u64::MAX`.
pub fn next_id(ids: impl IntoIterator<Item = u64>) -> Option<u64> {
    ids.into_iter().max().unwrap_or(0).checked_add(1)
}

/// Split on whitespace, keep only ASCII alphanumerics of each token, drop empty
/// tokens and repeats (first occurrence wins).
pub fn clean_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for token in raw.split_whitespace() {
        let cleaned: String = token.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if cleaned.is_empty() || tags.contains(&cleaned) {
            continue;
        }
        tags.push(cleaned);
    }
    tags
}

impl Post {
    pub fn create(
        title: &str,
        body: &str,
        raw_tags: &str,
        user_id: u64,
        existing: &[Post],
    ) -> Option<Self> {
        Some(Post {
            id: next_id(existing.iter().map(|p| p.id))?,
            title: title.to_string(),
            body: body.to_string(),
            tags: clean_tags(raw_tags),
            user_id,
            reactions: Reactions::default(),
            views: 0,
        })
    }
}

impl Comment {
    pub fn create(body: &str, post_id: u64, user: &User, existing: &[Comment]) -> Option<Self> {
        Some(Comment {
            id: next_id(existing.iter().map(|c| c.id))?,
            body: body.to_string(),
            post_id,
            likes: 0,
            user: CommentUser {
                id: user.id,
                full_name: user.full_name(),
                username: user.username.clone(),
            },
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_clean_tags_example() {
        assert_eq!(clean_tags("Hello, World!! foo_bar"), vec!["Hello", "World", "foobar"]);
    }

    #[test]
    fn test_clean_tags_dedupes_and_drops_empty() {
        assert_eq!(clean_tags("  rust  !!! rust, go  rust "), vec!["rust", "go"]);
        assert!(clean_tags("").is_empty());
        assert!(clean_tags("--- ###").is_empty());
        // case-sensitive, like the original form handler
        assert_eq!(clean_tags("Rust rust"), vec!["Rust", "rust"]);
    }

    #[test]
    fn test_clean_tags_idempotent() {
        let once = clean_tags("a-b c!d a_b é1 x\ty\nz");
        let twice = clean_tags(&once.join(" "));
        assert_eq!(once, twice);
        assert!(once.iter().all(|t| t.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(Vec::<u64>::new()), Some(1));
        assert_eq!(next_id([4, 9, 2]), Some(10));
    }

    #[test]
    fn test_next_id_at_max_is_none() {
        assert_eq!(next_id([3, u64::MAX]), None);
        let existing = vec![post(u64::MAX, 1, "x")];
        assert!(Post::create("t", "b", "", 1, &existing).is_none());
        let ds = dataset();
        let taken = vec![comment(u64::MAX, 1, &ds.users[0], "x")];
        assert!(Comment::create("hi", 1, &ds.users[0], &taken).is_none());
    }

    #[test]
    fn test_create_post_ids() {
        let empty = Post::create("t", "b", "", 1, &[]).unwrap();
        assert_eq!(empty.id, 1);

        let existing = vec![post(7, 1, "x"), post(3, 1, "y"), post(12, 2, "z")];
        let created = Post::create("Title", "Body", "one two", 2, &existing).unwrap();
        assert_eq!(created.id, 13);
        assert_eq!(created.tags, vec!["one", "two"]);
        assert_eq!(created.reactions, Reactions { likes: 0, dislikes: 0 });
        assert_eq!(created.views, 0);
        assert_eq!(created.user_id, 2);
    }

    #[test]
    fn test_create_comment_snapshots_user() {
        let ds = dataset();
        let author = ds.find_user(2).unwrap();
        let comment = Comment::create("hi", 1, author, &ds.comments).unwrap();
        assert_eq!(comment.id, 4);
        assert_eq!(comment.likes, 0);
        assert_eq!(comment.user.id, 2);
        assert_eq!(comment.user.username, "michaelw");
        assert_eq!(comment.user.full_name, "michaelw-first michaelw-last");
    }

    #[test]
    fn test_lookups() {
        let ds = dataset();
        assert_eq!(ds.username(1), Some("emilys"));
        assert_eq!(ds.username(99), None);
        let ids: Vec<u64> = ds.comments_for(1).map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(ds.find_post(5).is_none());
    }

    #[test]
    fn test_decodes_remote_shapes() {
        let post: Post = serde_json::from_str(
            r#"{"id":1,"title":"His mother had always taught him","body":"b",
                "tags":["history","american"],"reactions":{"likes":192,"dislikes":25},
                "views":305,"userId":121}"#,
        )
        .unwrap();
        assert_eq!(post.user_id, 121);
        assert_eq!(post.reactions.likes, 192);

        let comment: Comment = serde_json::from_str(
            r#"{"id":1,"body":"This is some awesome thinking!","postId":242,"likes":3,
                "user":{"id":105,"username":"emmac","fullName":"Emma Wilson"}}"#,
        )
        .unwrap();
        assert_eq!(comment.post_id, 242);
        assert_eq!(comment.user.full_name, "Emma Wilson");

        let user: User = serde_json::from_str(
            r#"{"id":1,"firstName":"Emily","lastName":"Johnson","maidenName":"Smith",
                "age":28,"username":"emilys"}"#,
        )
        .unwrap();
        assert_eq!(user.full_name(), "Emily Johnson");
    }
}
