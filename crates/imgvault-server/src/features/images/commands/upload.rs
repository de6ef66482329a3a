use crate::ingest::{ImageUpload, IngestError, IngestPipeline, IngestReceipt};

/// Longest filename accepted from a client.
pub const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Clone)]
pub struct UploadImageCommand {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

impl UploadImageCommand {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.filename.chars().count() > MAX_FILENAME_LENGTH {
            return Err(IngestError::InvalidInput(format!(
                "filename must not exceed {MAX_FILENAME_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

impl From<UploadImageCommand> for ImageUpload {
    fn from(command: UploadImageCommand) -> Self {
        ImageUpload::new(command.filename, command.content_type, command.content)
    }
}

#[tracing::instrument(skip(pipeline, command), fields(filename = %command.filename))]
pub async fn handle(
    pipeline: &IngestPipeline,
    command: UploadImageCommand,
) -> Result<IngestReceipt, IngestError> {
    command.validate()?;
    pipeline.ingest(command.into()).await
}
