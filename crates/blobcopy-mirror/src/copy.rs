use blobcopy_crypto::Transform;
use blobcopy_store::BlobStore;

use crate::error::MirrorResult;

/// Copy `from_key` in `from` to `to_key` in `to`, applying `transform` to
/// the content. The whole object is buffered. Returns bytes written.
pub async fn copy_object(
    from: &dyn BlobStore,
    from_key: &str,
    to: &dyn BlobStore,
    to_key: &str,
    transform: &Transform,
) -> MirrorResult<u64> {
    let data = from.read_all(from_key).await?;
    let data = transform.apply_content(data)?;
    let mut writer = to.new_writer(to_key).await?;
    writer.write(&data).await?;
    Ok(writer.close().await?)
}
