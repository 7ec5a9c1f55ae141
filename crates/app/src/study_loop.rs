//! Interactive study loop over stdin/stdout.
//!
//! All decisions (selection, grading, recording, cursor rules) live in the
//! services layer; this module only renders questions and translates key
//! presses into service calls. Gateway and storage errors become warnings so
//! a study session never aborts mid-way.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use services::{AnswerOutcome, StudyLoopService, StudySession};
use study_core::model::{Question, QuestionKind};

/// What the user asked for at a prompt.
enum Input {
    Text(String),
    Next,
    Prev,
    Jump(usize),
    Quit,
}

/// How one question interaction ended.
enum Flow {
    Answered,
    Navigated,
    Quit,
}

pub async fn run(
    service: Arc<StudyLoopService>,
    mut session: StudySession,
) -> io::Result<()> {
    println!(
        "{} question(s) selected. Commands: :n next, :p previous, :g <n> go to, :q quit.",
        session.len()
    );

    loop {
        let Some(question) = session.current() else {
            break;
        };
        let kind = question.kind;
        let at_last = session.position() == session.len();
        print_question(&session, question);

        let flow = match kind {
            QuestionKind::Flashcard => ask_flashcard(&service, &mut session).await?,
            QuestionKind::Quiz => ask_quiz(&service, &mut session).await?,
            QuestionKind::Essay => ask_essay(&service, &mut session).await?,
        };

        match flow {
            Flow::Quit => {
                println!(
                    "Position saved. Resume with: study --resume {}",
                    session.cursor_param()
                );
                break;
            }
            Flow::Answered if at_last => {
                println!("\nEnd of the set — {} question(s) done.", session.len());
                break;
            }
            Flow::Answered | Flow::Navigated => {}
        }
    }

    Ok(())
}

fn print_question(session: &StudySession, question: &Question) {
    let progress = session.progress();
    println!();
    println!(
        "── {}/{} · {} · {} ──",
        progress.position,
        progress.total,
        question.topic,
        question.kind
    );
    println!("{}", question.prompt);
}

/// Flashcard flow: reveal, then self-report. Flashcards auto-advance.
async fn ask_flashcard(
    service: &StudyLoopService,
    session: &mut StudySession,
) -> io::Result<Flow> {
    match prompt("[enter] to reveal the answer")? {
        Input::Text(_) => {}
        other => return Ok(handle_navigation(session, &other)),
    }

    if let Some(question) = session.current() {
        println!("Answer: {}", question.answer);
    }

    loop {
        match prompt("Did you know it? [y/n]")? {
            Input::Text(text) => match text.trim() {
                "y" | "yes" => {
                    report(service.answer_flashcard(session, true).await);
                    return Ok(Flow::Answered);
                }
                "n" | "no" => {
                    report(service.answer_flashcard(session, false).await);
                    return Ok(Flow::Answered);
                }
                _ => println!("Please answer y or n."),
            },
            other => return Ok(handle_navigation(session, &other)),
        }
    }
}

/// Quiz flow: pick an option, see the verdict, move on.
async fn ask_quiz(service: &StudyLoopService, session: &mut StudySession) -> io::Result<Flow> {
    let (options, reference) = match session.current() {
        Some(question) => (
            question.options.clone().unwrap_or_default(),
            question.answer.clone(),
        ),
        None => return Ok(Flow::Navigated),
    };

    if options.is_empty() {
        // Data-quality bug in stored content; skip rather than crash.
        println!("This question has no options configured; skipping.");
        session.next();
        return Ok(Flow::Answered);
    }

    for (i, option) in options.iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }

    loop {
        match prompt("Your answer [1-4]")? {
            Input::Text(text) => {
                let Ok(choice) = text.trim().parse::<usize>() else {
                    println!("Please enter an option number.");
                    continue;
                };
                let Some(selected) = options.get(choice.wrapping_sub(1)) else {
                    println!("Please enter an option number.");
                    continue;
                };

                match service.answer_quiz(session, selected).await {
                    Ok(outcome) if outcome.is_correct => println!("Correct!"),
                    Ok(_) => println!("Incorrect. The answer was: {reference}"),
                    Err(err) => eprintln!("warning: could not record the answer: {err}"),
                }
                session.next();
                return Ok(Flow::Answered);
            }
            other => return Ok(handle_navigation(session, &other)),
        }
    }
}

/// Essay flow: free text, graded by the gateway when it is configured.
async fn ask_essay(service: &StudyLoopService, session: &mut StudySession) -> io::Result<Flow> {
    let reference = session
        .current()
        .map(|q| q.answer.clone())
        .unwrap_or_default();

    match prompt("Write your answer")? {
        Input::Text(text) => {
            if text.trim().is_empty() {
                println!("Write something first.");
                return Ok(Flow::Navigated);
            }
            match service.answer_essay(session, &text).await {
                Ok(outcome) => {
                    if let Some(feedback) = &outcome.feedback {
                        let mark = if outcome.is_correct { "✓" } else { "✗" };
                        println!("{mark} {feedback}");
                    }
                    if !outcome.is_correct {
                        println!("Expected answer: {reference}");
                    }
                    session.next();
                    Ok(Flow::Answered)
                }
                Err(err) => {
                    eprintln!("warning: could not grade the answer: {err}");
                    Ok(Flow::Navigated)
                }
            }
        }
        other => Ok(handle_navigation(session, &other)),
    }
}

/// Apply a navigation input.
fn handle_navigation(session: &mut StudySession, input: &Input) -> Flow {
    match input {
        Input::Next => session.next(),
        Input::Prev => session.prev(),
        Input::Jump(position) => session.jump_to(*position),
        Input::Quit => return Flow::Quit,
        Input::Text(_) => {}
    }
    Flow::Navigated
}

fn prompt(label: &str) -> io::Result<Input> {
    print!("{label} > ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        // EOF behaves like quitting.
        return Ok(Input::Quit);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']);

    Ok(match trimmed {
        ":n" => Input::Next,
        ":p" => Input::Prev,
        ":q" => Input::Quit,
        other if other.starts_with(":g") => other
            .trim_start_matches(":g")
            .trim()
            .parse::<usize>()
            .map_or(Input::Text(other.to_string()), Input::Jump),
        other => Input::Text(other.to_string()),
    })
}

fn report<E: std::fmt::Display>(outcome: Result<AnswerOutcome, E>) {
    match outcome {
        Ok(outcome) if outcome.is_correct => println!("Marked as known."),
        Ok(_) => println!("Marked for review."),
        Err(err) => eprintln!("warning: could not record the answer: {err}"),
    }
}
