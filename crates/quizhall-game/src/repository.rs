//! Quiz storage boundary.
//!
//! The engine only ever reads a quiz once, when a host asks to play it.
//! Where quizzes live (a database, an editor's API, a file) is up to the
//! [`QuizRepository`] implementation. [`InMemoryQuizRepository`] covers
//! tests, demos, and small deployments loaded from a JSON document.

use std::collections::HashMap;
use std::future::Future;

use quizhall_protocol::{Quiz, QuizId};
use tokio::sync::RwLock;

use crate::RepositoryError;

/// Read and replace access to stored quizzes.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` so the directory can hold one for the life of
/// the server and call it from any connection task.
pub trait QuizRepository: Send + Sync + 'static {
    /// Looks up one quiz. `Ok(None)` if no quiz has this id.
    fn fetch_by_id(
        &self,
        id: &QuizId,
    ) -> impl Future<Output = Result<Option<Quiz>, RepositoryError>> + Send;

    /// Every stored quiz.
    fn list(&self) -> impl Future<Output = Result<Vec<Quiz>, RepositoryError>> + Send;

    /// Overwrites the quiz stored under `id`.
    ///
    /// Fails with [`RepositoryError::NotFound`] if there is none.
    fn replace(
        &self,
        id: &QuizId,
        quiz: Quiz,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// A [`QuizRepository`] backed by a map in memory.
#[derive(Debug, Default)]
pub struct InMemoryQuizRepository {
    quizzes: RwLock<HashMap<QuizId, Quiz>>,
}

impl InMemoryQuizRepository {
    pub fn new(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        Self {
            quizzes: RwLock::new(quizzes.into_iter().map(|q| (q.id.clone(), q)).collect()),
        }
    }

    /// Loads a JSON array of quizzes.
    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        let quizzes: Vec<Quiz> = serde_json::from_str(json)?;
        Ok(Self::new(quizzes))
    }
}

impl QuizRepository for InMemoryQuizRepository {
    async fn fetch_by_id(&self, id: &QuizId) -> Result<Option<Quiz>, RepositoryError> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Quiz>, RepositoryError> {
        let mut all: Vec<Quiz> = self.quizzes.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn replace(&self, id: &QuizId, quiz: Quiz) -> Result<(), RepositoryError> {
        let mut quizzes = self.quizzes.write().await;
        let Some(slot) = quizzes.get_mut(id) else {
            return Err(RepositoryError::NotFound(id.clone()));
        };
        *slot = Quiz {
            id: id.clone(),
            ..quiz
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"[
        {"id": "b", "name": "Second", "questions": []},
        {"id": "a", "name": "First", "questions": [{
            "id": "q1", "name": "Sky colour?", "time": 20,
            "choices": [
                {"id": "c1", "name": "Blue", "correct": true},
                {"id": "c2", "name": "Green", "correct": false}
            ]
        }]}
    ]"#;

    #[tokio::test]
    async fn test_fetch_by_id() {
        let repo = InMemoryQuizRepository::from_json(DOC).unwrap();
        let quiz = repo.fetch_by_id(&"a".into()).await.unwrap().unwrap();
        assert_eq!(quiz.name, "First");
        assert_eq!(quiz.questions[0].time_limit, 20);
        assert!(repo.fetch_by_id(&"zzz".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_id() {
        let repo = InMemoryQuizRepository::from_json(DOC).unwrap();
        let ids: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_replace_existing_keeps_id() {
        let repo = InMemoryQuizRepository::from_json(DOC).unwrap();
        let edited = Quiz {
            id: "ignored".into(),
            name: "Renamed".into(),
            questions: Vec::new(),
        };
        repo.replace(&"b".into(), edited).await.unwrap();

        let quiz = repo.fetch_by_id(&"b".into()).await.unwrap().unwrap();
        assert_eq!(quiz.name, "Renamed");
        assert_eq!(quiz.id, QuizId::from("b"));
    }

    #[tokio::test]
    async fn test_replace_unknown_fails() {
        let repo = InMemoryQuizRepository::default();
        let quiz = Quiz {
            id: "x".into(),
            name: "x".into(),
            questions: Vec::new(),
        };
        let err = repo.replace(&"x".into(), quiz).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            InMemoryQuizRepository::from_json("{not json"),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
