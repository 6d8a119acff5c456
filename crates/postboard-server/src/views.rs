//! Dataset → DomNode views. Everything here is pure; handlers decide what to load.

use std::borrow::Cow;

use postboard_dom::DomNode;
use postboard_render_html::{render_page, PageOptions};

use crate::model::{Comment, Dataset, Post, User};

pub const PREVIEW_CHARS: usize = 60;
/// A preview is only shortened to a word boundary that lies past this many characters.
pub const PREVIEW_MIN_CUT: usize = 40;

pub const UNKNOWN_USER: &str = "unknown user";

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;max-width:46rem;margin:0 auto;padding:1rem}\
nav{display:flex;gap:1rem;align-items:center;margin-bottom:1rem}\
nav form{margin:0}\
.banner{padding:.6rem .8rem;border-radius:4px;margin-bottom:1rem}\
.banner.error{background:#fde2e1;color:#7a1410}\
.banner.info{background:#e3f1fd;color:#0c3c66}\
a.preview{color:inherit;text-decoration:none;display:block}\
.postPreview,.post,.comment{border:1px solid #ddd;border-radius:4px;\
padding:.6rem .8rem;margin-bottom:.8rem}\
a.preview:focus .postPreview,a.preview:hover .postPreview{border-color:#888}\
.reactions form,.comment form{display:inline}\
.react{border:none;background:none;cursor:pointer;font-size:1rem}\
form.stack{display:flex;flex-direction:column;gap:.4rem}";

/// First `PREVIEW_CHARS` characters of `body`; if the last whitespace in that
/// window sits past `PREVIEW_MIN_CUT`, the preview stops just before it.
/// Bodies that fit are returned unchanged.
pub fn preview_body(body: &str) -> Cow<'_, str> {
    let end = match body.char_indices().nth(PREVIEW_CHARS) {
        Some((byte, _)) => byte,
        None => return Cow::Borrowed(body),
    };
    let window = &body[..end];
    let last_space = window
        .char_indices()
        .enumerate()
        .filter(|(_, (_, c))| c.is_whitespace())
        .last();
    match last_space {
        Some((pos, (byte, _))) if pos > PREVIEW_MIN_CUT => Cow::Borrowed(&window[..byte]),
        _ => Cow::Borrowed(window),
    }
}

pub fn author_name(dataset: &Dataset, user_id: u64) -> &str {
    dataset.username(user_id).unwrap_or(UNKNOWN_USER)
}

fn tags_text(tags: &[String]) -> String {
    tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ")
}

pub fn post_href(id: u64) -> String {
    format!("/posts/{}", id)
}

fn post_form(action: String) -> DomNode {
    DomNode::new("form").attr("method", "post").attr("action", action)
}

fn submit_button(label: &str) -> DomNode {
    DomNode::text("button", label).attr("type", "submit")
}

fn label(for_id: &str, text: &str) -> DomNode {
    DomNode::text("label", text).attr("for", for_id)
}

fn user_select(users: &[User]) -> DomNode {
    DomNode::new("select")
        .attr("id", "userId")
        .attr("name", "userId")
        .flag("required")
        .with_children(users.iter().map(|u| {
            DomNode::text("option", &u.username).attr("value", u.id.to_string())
        }))
}

// ── List view ───────────────────────────────────────────────────────

fn render_preview(dataset: &Dataset, post: &Post) -> DomNode {
    let preview = preview_body(&post.body);
    let body = if preview.len() < post.body.len() {
        format!("{}..", preview)
    } else {
        preview.into_owned()
    };

    let article = DomNode::new("article").class_name("postPreview").with_children([
        DomNode::text("h2", &post.title),
        DomNode::text("p", &body),
        DomNode::text("p", &tags_text(&post.tags)).class_name("tags"),
        DomNode::new("p").child(DomNode::text(
            "b",
            &format!(" - {}", author_name(dataset, post.user_id)),
        )),
    ]);

    DomNode::new("a")
        .with_key(format!("post-{}", post.id))
        .class_name("preview")
        .attr("href", post_href(post.id))
        .attr("tabindex", "0")
        .child(article)
}

/// Every post, newest first.
pub fn render_list(dataset: &Dataset) -> DomNode {
    let section = DomNode::new("section").with_key("posts").class_name("posts");
    if dataset.posts.is_empty() {
        return section.child(DomNode::text("p", "No posts yet."));
    }
    section.with_children(dataset.posts.iter().rev().map(|p| render_preview(dataset, p)))
}

// ── Detail view ─────────────────────────────────────────────────────

fn render_comment(comment: &Comment) -> DomNode {
    DomNode::new("div")
        .with_key(format!("comment-{}", comment.id))
        .class_name("comment")
        .with_children([
            DomNode::text("p", &comment.body),
            DomNode::new("p").child(DomNode::text("b", &comment.user.username)),
            post_form(format!(
                "/posts/{}/comments/{}/like",
                comment.post_id, comment.id
            ))
            .child(submit_button(&format!("{}❤️", comment.likes)).class_name("react")),
        ])
}

fn render_comment_form(dataset: &Dataset, post_id: u64) -> DomNode {
    let form = post_form(format!("/posts/{}/comments", post_id))
        .with_key("comment-form")
        .class_name("stack")
        .with_children([
            label("commentBody", "Comment:"),
            DomNode::new("textarea")
                .attr("id", "commentBody")
                .attr("name", "commentBody")
                .flag("required"),
            label("userId", "Posting user:"),
            user_select(&dataset.users),
            submit_button("Submit"),
        ]);
    DomNode::new("article").child(form)
}

/// One post with reactions, its comments and the comment form. `None` if the post is absent.
pub fn render_detail(dataset: &Dataset, post_id: u64) -> Option<DomNode> {
    let post = dataset.find_post(post_id)?;

    let reactions = DomNode::new("div").class_name("reactions").with_children([
        post_form(format!("/posts/{}/reactions/like", post.id)).child(
            submit_button(&format!("{}❤️", post.reactions.likes))
                .with_key("like")
                .class_name("react"),
        ),
        post_form(format!("/posts/{}/reactions/dislike", post.id)).child(
            submit_button(&format!("{}💩", post.reactions.dislikes))
                .with_key("dislike")
                .class_name("react"),
        ),
    ]);

    let article = DomNode::new("article")
        .with_key(format!("post-{}", post.id))
        .class_name("post")
        .with_children([
            DomNode::text("h2", &post.title),
            DomNode::text("p", &post.body),
            DomNode::text("p", &tags_text(&post.tags)).class_name("tags"),
            DomNode::text("b", author_name(dataset, post.user_id)),
            reactions,
        ]);

    let mut view = DomNode::new("section").with_key("detail").child(article);

    let comments: Vec<DomNode> = dataset.comments_for(post.id).map(render_comment).collect();
    if !comments.is_empty() {
        view = view.child(
            DomNode::new("article")
                .with_key("comments")
                .class_name("comments")
                .with_children(comments),
        );
    }

    Some(view.child(render_comment_form(dataset, post.id)))
}

// ── New post form ───────────────────────────────────────────────────

pub fn render_new_post_form(dataset: &Dataset) -> DomNode {
    let form = post_form("/posts".into())
        .with_key("post-form")
        .class_name("stack")
        .with_children([
            label("title", "Title:"),
            DomNode::new("input")
                .attr("type", "text")
                .attr("id", "title")
                .attr("name", "title")
                .flag("required"),
            label("body", "Message:"),
            DomNode::new("textarea")
                .attr("id", "body")
                .attr("name", "body")
                .flag("required"),
            label("tags", "Tags:"),
            DomNode::new("input")
                .attr("type", "text")
                .attr("id", "tags")
                .attr("name", "tags"),
            label("userId", "Posting user:"),
            user_select(&dataset.users),
            submit_button("Submit"),
        ]);
    DomNode::new("article").child(form)
}

// ── Chrome ──────────────────────────────────────────────────────────

pub fn render_error(message: &str) -> DomNode {
    DomNode::text("div", message)
        .with_key("banner")
        .class_name("banner error")
        .attr("role", "alert")
}

pub fn render_notice(message: &str) -> DomNode {
    DomNode::text("div", message)
        .with_key("banner")
        .class_name("banner info")
        .attr("role", "status")
}

fn nav() -> DomNode {
    DomNode::new("nav").with_children([
        DomNode::text("a", "Posts").attr("href", "/"),
        DomNode::text("a", "New post").attr("href", "/posts/new"),
        post_form("/clear".into()).child(submit_button("Clear cache")),
    ])
}

pub fn layout(content: DomNode, banner: Option<DomNode>) -> DomNode {
    let mut main = DomNode::new("main").attr("id", "main-content");
    if let Some(b) = banner {
        main = main.child(b);
    }
    DomNode::new("div")
        .with_key("app")
        .with_children([nav(), main.child(content)])
}

/// Full HTML document for a view.
pub fn page(title: &str, content: DomNode, banner: Option<DomNode>) -> String {
    let mut opts = PageOptions::new(layout(content, banner));
    opts.title = Some(format!("{} · postboard", title));
    opts.inline_css = Some(STYLE.to_string());
    render_page(&opts)
}
