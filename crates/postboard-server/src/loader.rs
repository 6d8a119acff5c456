//! Resolves the dataset from the local snapshot, or from the remote API on a miss.

use crate::error::BoardError;
use crate::model::{Comment, Dataset, Post, User};
use crate::remote::{extract_collection, RemoteSource, Resource};
use crate::store::{Persistence, SnapshotStore};

pub struct DataLoader<R, S> {
    remote: R,
    cache: Persistence<S>,
}

impl<R, S> DataLoader<R, S>
where
    R: RemoteSource + Sync,
    S: SnapshotStore + Sync,
{
    pub fn new(remote: R, cache: Persistence<S>) -> Self {
        Self { remote, cache }
    }

    pub fn cache(&self) -> &Persistence<S> {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// A stored snapshot is returned as-is, with no staleness check. Otherwise the
    /// three collections are fetched concurrently and the combined dataset is
    /// written through before it is returned.
    pub async fn load(&self) -> Result<Dataset, BoardError> {
        if let Some(dataset) = self.cache.load()? {
            tracing::debug!(key = self.cache.key(), "snapshot hit");
            return Ok(dataset);
        }
        tracing::info!(key = self.cache.key(), "snapshot miss, fetching remote data");

        let dataset = match self.fetch_all().await {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "remote load failed");
                return Err(e);
            }
        };

        self.cache.save(&dataset)?;
        tracing::info!(
            users = dataset.users.len(),
            posts = dataset.posts.len(),
            comments = dataset.comments.len(),
            "remote data loaded and stored"
        );
        Ok(dataset)
    }

    async fn fetch_all(&self) -> Result<Dataset, BoardError> {
        let (users, posts, comments) = tokio::try_join!(
            self.remote.fetch(Resource::Users),
            self.remote.fetch(Resource::Posts),
            self.remote.fetch(Resource::Comments),
        )?;

        Ok(Dataset {
            users: extract_collection::<User>(Resource::Users, users)?,
            posts: extract_collection::<Post>(Resource::Posts, posts)?,
            comments: extract_collection::<Comment>(Resource::Comments, comments)?,
        })
    }

    pub fn clear(&self) -> Result<(), BoardError> {
        self.cache.clear()?;
        Ok(())
    }
}
