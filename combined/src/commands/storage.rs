//! Presign command - Presigned object storage URLs.

use std::time::Duration;

use common::AppResult;
use storage::{Sign, SignMethod};

use crate::cli::args::PresignArgs;
use crate::container::ServiceContainer;

/// Execute the presign command
pub async fn presign(args: PresignArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    let method: SignMethod = args.method.parse()?;
    let sign = Sign::new(args.key)?
        .method(method)
        .expires_in(Duration::from_secs(args.expires_in))?;

    services.storage()?.sign(sign).await
}
