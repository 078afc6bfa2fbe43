use drive_core::{DriveClient, DriveError, download_url};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("api error: {0}")]
    Api(#[from] DriveError),
    #[error("\"{name}\" (id {id}) is not a folder, it is {mime_type}")]
    NotAFolder {
        id: String,
        name: String,
        mime_type: String,
    },
    #[error("folder \"{name}\" (id {id}) is trashed")]
    Trashed { id: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub id: String,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn download_url(&self) -> String {
        download_url(&self.id)
    }
}

/// Snapshot of a remote folder and everything below it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteFolder {
    pub name: String,
    pub id: String,
    pub files: Vec<RemoteFile>,
    pub folders: Vec<RemoteFolder>,
}

impl RemoteFolder {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: RemoteFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_folder(mut self, folder: RemoteFolder) -> Self {
        self.folders.push(folder);
        self
    }

    /// Folders in this subtree, including `self`.
    pub fn folder_count(&self) -> usize {
        1 + self.folders.iter().map(RemoteFolder::folder_count).sum::<usize>()
    }

    pub fn file_count(&self) -> usize {
        self.files.len() + self.folders.iter().map(RemoteFolder::file_count).sum::<usize>()
    }
}

/// Borrowed view over either kind of tree node.
#[derive(Debug, Clone, Copy)]
pub enum RemoteNode<'a> {
    File(&'a RemoteFile),
    Folder(&'a RemoteFolder),
}

impl<'a> RemoteNode<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            RemoteNode::File(file) => &file.name,
            RemoteNode::Folder(folder) => &folder.name,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            RemoteNode::File(file) => &file.id,
            RemoteNode::Folder(folder) => &folder.id,
        }
    }
}

pub struct DriveMirror<'a> {
    client: &'a DriveClient,
    page_size: u32,
}

impl<'a> DriveMirror<'a> {
    pub fn new(client: &'a DriveClient) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches the whole hierarchy below `root_id`. The root must be a non-trashed folder.
    pub async fn mirror(&self, root_id: &str) -> Result<RemoteFolder, MirrorError> {
        let root = self.client.get_file(root_id).await?;
        if root.trashed {
            return Err(MirrorError::Trashed {
                id: root.id,
                name: root.name,
            });
        }
        if !root.is_folder() {
            return Err(MirrorError::NotAFolder {
                id: root.id,
                name: root.name,
                mime_type: root.mime_type,
            });
        }
        let tree = self.mirror_folder(root.id, root.name).await?;
        tracing::info!(
            folder = %tree.name,
            folders = tree.folder_count(),
            files = tree.file_count(),
            "mirrored remote folder tree"
        );
        Ok(tree)
    }

    // Children come from a trashed=false listing, so only the root needs validating.
    async fn mirror_folder(&self, id: String, name: String) -> Result<RemoteFolder, MirrorError> {
        let children = self.client.list_children_all(&id, self.page_size).await?;
        let mut folder = RemoteFolder::new(name, id);
        let mut subfolders = Vec::new();
        for child in children {
            if child.is_folder() {
                subfolders.push(child);
            } else {
                folder.files.push(RemoteFile::new(child.name, child.id));
            }
        }
        tracing::debug!(
            folder = %folder.name,
            files = folder.files.len(),
            subfolders = subfolders.len(),
            "listed folder"
        );
        for child in subfolders {
            let sub = Box::pin(self.mirror_folder(child.id, child.name)).await?;
            folder.folders.push(sub);
        }
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::test_support::{FOLDER_MIME as FOLDER, mount_children, mount_file};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn counts_cover_the_whole_subtree() {
        let tree = RemoteFolder::new("root", "r")
            .with_file(RemoteFile::new("a.png", "1"))
            .with_folder(
                RemoteFolder::new("sub", "s")
                    .with_file(RemoteFile::new("b.png", "2"))
                    .with_file(RemoteFile::new("c.png", "3")),
            );
        assert_eq!(tree.folder_count(), 2);
        assert_eq!(tree.file_count(), 3);
    }

    #[test]
    fn remote_node_exposes_identity() {
        let file = RemoteFile::new("a.png", "1");
        let folder = RemoteFolder::new("root", "r");
        assert_eq!(RemoteNode::File(&file).id(), "1");
        assert_eq!(RemoteNode::Folder(&folder).name(), "root");
        assert!(file.download_url().ends_with("id=1"));
    }

    #[tokio::test]
    async fn mirror_builds_nested_tree() {
        let server = MockServer::start().await;
        mount_file(&server, "root", "Mod", FOLDER, false).await;
        mount_children(
            &server,
            "root",
            json!([
                { "id": "f1", "name": "Recon.A.png", "mimeType": "image/png" },
                { "id": "sub", "name": "Tokens", "mimeType": FOLDER }
            ]),
        )
        .await;
        mount_children(
            &server,
            "sub",
            json!([
                { "id": "f2", "name": "Smoke.token.png", "mimeType": "image/png" }
            ]),
        )
        .await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = DriveMirror::new(&client).mirror("root").await.unwrap();

        assert_eq!(tree.name, "Mod");
        assert_eq!(tree.files, vec![RemoteFile::new("Recon.A.png", "f1")]);
        assert_eq!(tree.folders.len(), 1);
        assert_eq!(tree.folders[0].name, "Tokens");
        assert_eq!(tree.folders[0].files[0].id, "f2");
    }

    #[tokio::test]
    async fn mirror_keeps_only_listed_children() {
        // The listing query excludes trashed items, so a folder holding one trashed and one
        // active file comes back with a single entry.
        let server = MockServer::start().await;
        mount_file(&server, "root", "Mod", FOLDER, false).await;
        mount_children(
            &server,
            "root",
            json!([{ "id": "live", "name": "live.png", "mimeType": "image/png" }]),
        )
        .await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let tree = DriveMirror::new(&client).mirror("root").await.unwrap();

        assert_eq!(tree.files.len(), 1);
        assert_eq!(tree.files[0].id, "live");
    }

    #[tokio::test]
    async fn mirror_rejects_non_folder_root() {
        let server = MockServer::start().await;
        mount_file(&server, "img", "a.png", "image/png", false).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let err = DriveMirror::new(&client).mirror("img").await.unwrap_err();

        assert!(matches!(err, MirrorError::NotAFolder { ref mime_type, .. } if mime_type == "image/png"));
    }

    #[tokio::test]
    async fn mirror_rejects_trashed_root() {
        let server = MockServer::start().await;
        mount_file(&server, "root", "Old", FOLDER, true).await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let err = DriveMirror::new(&client).mirror("root").await.unwrap_err();

        assert!(matches!(err, MirrorError::Trashed { ref name, .. } if name == "Old"));
    }

    #[tokio::test]
    async fn mirror_propagates_listing_failures() {
        let server = MockServer::start().await;
        mount_file(&server, "root", "Mod", FOLDER, false).await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let err = DriveMirror::new(&client).mirror("root").await.unwrap_err();

        assert!(matches!(err, MirrorError::Api(DriveError::Api { .. })));
    }
}
