use rand::seq::IndexedRandom;

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: u32,
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
}

pub trait QuizProvider {
    fn question(&self, id: u32) -> Option<&Quiz>;

    fn random_question(&self) -> Option<&Quiz>;

    fn is_correct(&self, id: u32, answer: &str) -> bool {
        self.question(id)
            .is_some_and(|quiz| quiz.answer.eq_ignore_ascii_case(answer.trim()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticQuizBank {
    quizzes: Vec<Quiz>,
}

impl StaticQuizBank {
    pub fn new(quizzes: Vec<Quiz>) -> Self {
        Self { quizzes }
    }

    pub fn builtin() -> Self {
        let quiz = |id: u32, question: &str, answer: &str, options: [&str; 4]| Quiz {
            id,
            question: question.to_string(),
            answer: answer.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        };

        Self::new(vec![
            quiz(1, "What is 2 + 2?", "4", ["3", "4", "5", "6"]),
            quiz(2, "How many days are in a week?", "7", ["5", "6", "7", "8"]),
            quiz(3, "Which planet is closest to the sun?", "Mercury", ["Venus", "Mercury", "Mars", "Earth"]),
            quiz(4, "What is 10 x 5?", "50", ["15", "50", "105", "500"]),
            quiz(5, "How many letters are in the word \"LEDGER\"?", "6", ["5", "6", "7", "8"]),
        ])
    }
}

impl QuizProvider for StaticQuizBank {
    fn question(&self, id: u32) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.id == id)
    }

    fn random_question(&self) -> Option<&Quiz> {
        self.quizzes.choose(&mut rand::rng())
    }
}
