use async_trait::async_trait;

use crate::domain::{PhoneNumber, Task};

use super::RepositoryError;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<(), RepositoryError>;

    async fn list_open_for(
        &self,
        phone: &PhoneNumber,
        limit: usize,
    ) -> Result<Vec<Task>, RepositoryError>;
}
