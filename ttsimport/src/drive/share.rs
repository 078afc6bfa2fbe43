use drive_core::{DriveClient, DriveError, MAX_BATCH_REQUESTS, Permission};
use thiserror::Error;

use super::tree::{RemoteFolder, RemoteNode};

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("api error: {0}")]
    Api(#[from] DriveError),
    #[error("failed to share \"{name}\" (id {id}): {detail}")]
    PermissionGrantFailed {
        id: String,
        name: String,
        detail: String,
    },
}

/// Grants "anyone with the link can view" on every folder and file of a mirrored tree.
pub struct LinkSharer<'a> {
    client: &'a DriveClient,
    batch_size: usize,
    permission: Permission,
}

impl<'a> LinkSharer<'a> {
    pub fn new(client: &'a DriveClient) -> Self {
        Self {
            client,
            batch_size: MAX_BATCH_REQUESTS,
            permission: Permission::anyone_reader(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_REQUESTS);
        self
    }

    pub async fn propagate(&self, root: &RemoteFolder) -> Result<(), ShareError> {
        self.share_folder(root).await?;
        for folder in &root.folders {
            Box::pin(self.propagate(folder)).await?;
        }
        Ok(())
    }

    // The folder plus its direct files; nested files are handled when recursion reaches them.
    async fn share_folder(&self, folder: &RemoteFolder) -> Result<(), ShareError> {
        let unit: Vec<RemoteNode<'_>> = std::iter::once(RemoteNode::Folder(folder))
            .chain(folder.files.iter().map(RemoteNode::File))
            .collect();
        tracing::info!(
            folder = %folder.name,
            id = %folder.id,
            files = folder.files.len(),
            batch_size = self.batch_size,
            "sharing folder and its files"
        );

        for chunk in unit.chunks(self.batch_size) {
            let ids: Vec<&str> = chunk.iter().map(RemoteNode::id).collect();
            let results = self
                .client
                .create_permissions_batch(&ids, &self.permission)
                .await?;
            for (node, result) in chunk.iter().zip(results) {
                if let Err(err) = result {
                    return Err(ShareError::PermissionGrantFailed {
                        id: node.id().to_string(),
                        name: node.name().to_string(),
                        detail: err.to_string(),
                    });
                }
                tracing::debug!(name = node.name(), id = node.id(), "shared");
            }
            tracing::info!(items = chunk.len(), "batch granted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::test_support::{batch_target_ids, mount_batch};
    use crate::drive::tree::RemoteFile;
    use wiremock::MockServer;

    async fn batch_sizes(server: &MockServer) -> Vec<usize> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|request| batch_target_ids(request).len())
            .collect()
    }

    fn folder_with_files(name: &str, id: &str, count: usize) -> RemoteFolder {
        let mut folder = RemoteFolder::new(name, id);
        for i in 0..count {
            folder
                .files
                .push(RemoteFile::new(format!("{i}.png"), format!("{id}-f{i}")));
        }
        folder
    }

    #[tokio::test]
    async fn large_folder_is_split_at_batch_limit() {
        let server = MockServer::start().await;
        mount_batch(&server, &[]).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = folder_with_files("Big", "big", 150);
        LinkSharer::new(&client).propagate(&tree).await.unwrap();

        assert_eq!(batch_sizes(&server).await, vec![100, 51]);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(batch_target_ids(&requests[0])[0], "big");
        assert_eq!(batch_target_ids(&requests[1])[50], "big-f149");
    }

    #[tokio::test]
    async fn empty_folder_shares_only_itself() {
        let server = MockServer::start().await;
        mount_batch(&server, &[]).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = RemoteFolder::new("Empty", "empty");
        LinkSharer::new(&client).propagate(&tree).await.unwrap();

        assert_eq!(batch_sizes(&server).await, vec![1]);
    }

    #[tokio::test]
    async fn nested_folders_get_their_own_batches() {
        let server = MockServer::start().await;
        mount_batch(&server, &[]).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = folder_with_files("Root", "root", 2)
            .with_folder(folder_with_files("A", "a", 3))
            .with_folder(folder_with_files("B", "b", 0));
        LinkSharer::new(&client).propagate(&tree).await.unwrap();

        assert_eq!(batch_sizes(&server).await, vec![3, 4, 1]);
    }

    #[tokio::test]
    async fn smaller_batch_size_changes_chunking() {
        let server = MockServer::start().await;
        mount_batch(&server, &[]).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = folder_with_files("Root", "root", 4);
        LinkSharer::new(&client)
            .with_batch_size(2)
            .propagate(&tree)
            .await
            .unwrap();

        assert_eq!(batch_sizes(&server).await, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn item_failure_aborts_propagation() {
        let server = MockServer::start().await;
        mount_batch(&server, &["root-f1"]).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = folder_with_files("Root", "root", 3).with_folder(folder_with_files("A", "a", 1));
        let err = LinkSharer::new(&client).propagate(&tree).await.unwrap_err();

        match err {
            ShareError::PermissionGrantFailed { id, name, detail } => {
                assert_eq!(id, "root-f1");
                assert_eq!(name, "1.png");
                assert!(detail.contains("sharing disabled"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The sub-folder is never reached.
        assert_eq!(batch_sizes(&server).await, vec![4]);
    }
}
