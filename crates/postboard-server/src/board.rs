//! The session's single dataset owner and every operation that mutates it.
//!
//! Mutations load the dataset if needed, then write the changed snapshot back.
//! The in-memory copy only moves forward once that write has succeeded.

use std::str::FromStr;

use crate::error::BoardError;
use crate::loader::DataLoader;
use crate::model::{Comment, Dataset, Post, Reactions};
use crate::remote::RemoteSource;
use crate::store::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" | "likes" => Ok(Self::Like),
            "dislike" | "dislikes" => Ok(Self::Dislike),
            other => Err(format!("unknown reaction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub tags: String,
    pub user_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    pub user_id: u64,
}

pub struct Board<R, S> {
    loader: DataLoader<R, S>,
    dataset: Option<Dataset>,
}

impl<R, S> Board<R, S>
where
    R: RemoteSource + Sync,
    S: SnapshotStore + Sync,
{
    pub fn new(loader: DataLoader<R, S>) -> Self {
        Self { loader, dataset: None }
    }

    pub fn loader(&self) -> &DataLoader<R, S> {
        &self.loader
    }

    /// The dataset if it has been loaded this session.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub async fn load_dataset(&mut self) -> Result<&Dataset, BoardError> {
        Ok(&*self.loaded().await?)
    }

    async fn loaded(&mut self) -> Result<&mut Dataset, BoardError> {
        let dataset = match self.dataset.take() {
            Some(d) => d,
            None => self.loader.load().await?,
        };
        Ok(self.dataset.insert(dataset))
    }

    pub fn clear_dataset(&mut self) -> Result<(), BoardError> {
        self.dataset = None;
        self.loader.clear()?;
        tracing::info!("local data cleared");
        Ok(())
    }

    /// Applies `change` to a copy of the dataset. The copy replaces the in-memory
    /// dataset only after the snapshot write succeeds, so a failed write leaves
    /// both untouched.
    async fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Dataset) -> Result<T, BoardError> + Send,
    ) -> Result<T, BoardError> {
        let mut next = self.loaded().await?.clone();
        let out = change(&mut next)?;
        if let Err(e) = self.loader.cache().save(&next) {
            tracing::error!(error = %e, "snapshot write failed");
            return Err(e.into());
        }
        self.dataset = Some(next);
        Ok(out)
    }

    pub async fn submit_new_post(&mut self, form: NewPost) -> Result<Post, BoardError> {
        let post = self
            .commit(|dataset| {
                let post = Post::create(
                    &form.title,
                    &form.body,
                    &form.tags,
                    form.user_id,
                    &dataset.posts,
                )
                .ok_or(BoardError::IdsExhausted("post"))?;
                dataset.posts.push(post.clone());
                Ok(post)
            })
            .await?;
        tracing::info!(post_id = post.id, user_id = post.user_id, "post created");
        Ok(post)
    }

    pub async fn submit_new_comment(
        &mut self,
        post_id: u64,
        form: NewComment,
    ) -> Result<Comment, BoardError> {
        let comment = self
            .commit(|dataset| {
                if dataset.find_post(post_id).is_none() {
                    return Err(BoardError::PostNotFound(post_id));
                }
                let user = dataset
                    .find_user(form.user_id)
                    .ok_or(BoardError::UnknownUser(form.user_id))?;
                let comment = Comment::create(&form.body, post_id, user, &dataset.comments)
                    .ok_or(BoardError::IdsExhausted("comment"))?;
                dataset.comments.push(comment.clone());
                Ok(comment)
            })
            .await?;
        tracing::info!(post_id, comment_id = comment.id, "comment created");
        Ok(comment)
    }

    pub async fn increment_reaction(
        &mut self,
        post_id: u64,
        kind: ReactionKind,
    ) -> Result<Reactions, BoardError> {
        let reactions = self
            .commit(|dataset| {
                let post = dataset
                    .find_post_mut(post_id)
                    .ok_or(BoardError::PostNotFound(post_id))?;
                match kind {
                    ReactionKind::Like => post.reactions.likes += 1,
                    ReactionKind::Dislike => post.reactions.dislikes += 1,
                }
                Ok(post.reactions)
            })
            .await?;
        tracing::debug!(post_id, ?kind, "reaction recorded");
        Ok(reactions)
    }

    pub async fn increment_comment_like(
        &mut self,
        post_id: u64,
        comment_id: u64,
    ) -> Result<u64, BoardError> {
        let likes = self
            .commit(|dataset| {
                let comment = dataset
                    .comments
                    .iter_mut()
                    .find(|c| c.id == comment_id && c.post_id == post_id)
                    .ok_or(BoardError::CommentNotFound { post_id, comment_id })?;
                comment.likes += 1;
                Ok(comment.likes)
            })
            .await?;
        tracing::debug!(post_id, comment_id, "comment like recorded");
        Ok(likes)
    }
}
