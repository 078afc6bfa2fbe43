mod batch;
mod client;

pub use client::{
    BatchItemError, DriveClient, DriveError, DriveFile, FOLDER_MIME_TYPE, FileList, GranteeType,
    MAX_BATCH_REQUESTS, Permission, PermissionRole, download_url,
};
