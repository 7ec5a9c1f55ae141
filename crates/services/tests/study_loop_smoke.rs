use std::sync::Arc;

use services::gateway::GradingGateway;
use services::review_service::ReviewService;
use services::study::StudyLoopService;
use storage::repository::{
    InMemoryRepository, NewQuestionRecord, ProgressRepository, QuestionRepository,
};
use study_core::model::{QuestionDraft, QuestionKind};
use study_core::selector::{ReviewFilter, TopicFilter};
use study_core::time::fixed_clock;

fn flashcard(prompt: &str) -> QuestionDraft {
    QuestionDraft {
        kind: QuestionKind::Flashcard,
        prompt: prompt.into(),
        answer: format!("answer to {prompt}"),
        options: None,
    }
}

fn quiz(prompt: &str, answer: &str) -> QuestionDraft {
    QuestionDraft {
        kind: QuestionKind::Quiz,
        prompt: prompt.into(),
        answer: answer.into(),
        options: Some(vec![answer.into(), "B".into(), "C".into(), "D".into()]),
    }
}

fn study_loop(repo: &InMemoryRepository) -> StudyLoopService {
    let review = Arc::new(ReviewService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(GradingGateway::new(None)),
    ));
    StudyLoopService::new(Arc::new(repo.clone()), Arc::new(repo.clone()), review)
}

async fn seed(repo: &InMemoryRepository) {
    let batch: Vec<NewQuestionRecord> = [
        flashcard("What is ownership?"),
        quiz("Which keyword borrows?", "&"),
        flashcard("What is a lifetime?"),
    ]
    .iter()
    .map(|draft| NewQuestionRecord::from_validated(&draft.clone().validate("Rust").unwrap()))
    .collect();
    repo.insert_questions(&batch).await.unwrap();
}

#[tokio::test]
async fn full_study_pass_appends_one_entry_per_answer() {
    let repo = InMemoryRepository::new();
    seed(&repo).await;
    let service = study_loop(&repo);

    let filter = ReviewFilter::new(TopicFilter::named("Rust"), None, false);
    let mut session = service.start_session("ada", filter, None).await.unwrap();
    assert_eq!(session.len(), 3);
    assert_eq!(session.position(), 1);

    // Flashcards auto-advance.
    let outcome = service.answer_flashcard(&mut session, false).await.unwrap();
    assert!(!outcome.is_correct);
    assert_eq!(session.position(), 2);

    // Quiz answers stay put so the user sees the result.
    let outcome = service.answer_quiz(&mut session, "&").await.unwrap();
    assert!(outcome.is_correct);
    assert_eq!(session.position(), 2);
    session.next();

    let outcome = service.answer_flashcard(&mut session, true).await.unwrap();
    assert!(outcome.is_correct);

    let entries = repo.entries_for_user("ada").await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.username == "ada"));
}

#[tokio::test]
async fn failed_only_session_shows_what_was_missed() {
    let repo = InMemoryRepository::new();
    seed(&repo).await;
    let service = study_loop(&repo);

    let filter = ReviewFilter::new(TopicFilter::All, None, false);
    let mut session = service.start_session("ada", filter, None).await.unwrap();

    // Miss the first flashcard, know the last one, skip the quiz.
    service.answer_flashcard(&mut session, false).await.unwrap();
    session.jump_to(3);
    service.answer_flashcard(&mut session, true).await.unwrap();

    let review_filter = ReviewFilter::new(TopicFilter::All, None, true);
    let review_session = service
        .start_session("ada", review_filter, None)
        .await
        .unwrap();
    assert_eq!(review_session.len(), 1);
    assert_eq!(
        review_session.current().unwrap().prompt,
        "What is ownership?"
    );

    // Another user's log does not bleed into ada's review set.
    let bob_filter = ReviewFilter::new(TopicFilter::All, None, true);
    let bob_session = service.start_session("bob", bob_filter, None).await.unwrap();
    assert!(bob_session.is_empty());
}

#[tokio::test]
async fn cursor_param_resumes_across_sessions() {
    let repo = InMemoryRepository::new();
    seed(&repo).await;
    let service = study_loop(&repo);

    let filter = ReviewFilter::new(TopicFilter::All, None, false);
    let mut session = service
        .start_session("ada", filter.clone(), None)
        .await
        .unwrap();
    session.next();
    session.next();
    let param = session.cursor_param();
    drop(session);

    let resumed = service
        .start_session("ada", filter, Some(&param))
        .await
        .unwrap();
    assert_eq!(resumed.position(), 3);
}

#[tokio::test]
async fn refresh_keeps_cursor_unless_the_list_shrinks_past_it() {
    let repo = InMemoryRepository::new();
    seed(&repo).await;
    let service = study_loop(&repo);

    // Fail everything once: flashcard, quiz (wrong option), flashcard.
    let filter = ReviewFilter::new(TopicFilter::All, None, false);
    let mut warmup = service.start_session("ada", filter, None).await.unwrap();
    service.answer_flashcard(&mut warmup, false).await.unwrap();
    service.answer_quiz(&mut warmup, "C").await.unwrap();
    warmup.next();
    service.answer_flashcard(&mut warmup, false).await.unwrap();

    let review_filter = ReviewFilter::new(TopicFilter::All, None, true);
    let mut session = service
        .start_session("ada", review_filter, None)
        .await
        .unwrap();
    assert_eq!(session.len(), 3);

    // Clear the last question from the review set, then refresh.
    session.jump_to(3);
    service.answer_flashcard(&mut session, true).await.unwrap();
    service.refresh_session(&mut session).await.unwrap();

    // The set shrank to 2 and the cursor had run past it: back to the start.
    assert_eq!(session.len(), 2);
    assert_eq!(session.position(), 1);

    // An in-range cursor survives a refresh untouched.
    session.jump_to(2);
    service.refresh_session(&mut session).await.unwrap();
    assert_eq!(session.position(), 2);
}
