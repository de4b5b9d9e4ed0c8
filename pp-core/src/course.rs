//! Course generator
//!
//! Builds civic-education courses from templates. Variation comes from the
//! supplied RNG, so tests can pass a seeded one.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const MIN_LESSONS: usize = 1;
pub const MAX_LESSONS: usize = 12;
pub const MAX_TOPIC_LEN: usize = 120;

/// Course difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(CoreError::validation(format!("Unknown difficulty: {}", s))),
        }
    }

    fn minutes_per_lesson(&self) -> i32 {
        match self {
            Self::Beginner => 10,
            Self::Intermediate => 15,
            Self::Advanced => 25,
        }
    }

    fn reward_multiplier(&self) -> i64 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLesson {
    pub title: String,
    pub content: String,
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCourse {
    pub title: String,
    pub description: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub lessons: Vec<GeneratedLesson>,
    pub estimated_minutes: i32,
    pub reward_tokens: i64,
    pub reward_experience: i64,
}

const TITLE_TEMPLATES: &[&str] = &[
    "Understanding {topic}",
    "{topic} for Changemakers",
    "The Power of {topic}",
    "{topic}: From Ideas to Action",
];

const LESSON_ANGLES: &[&str] = &[
    "Foundations",
    "Key Players",
    "History and Context",
    "Organizing Around",
    "Common Misconceptions",
    "Measuring Impact",
    "Case Studies",
    "Building Coalitions",
    "Communicating",
    "Taking Action",
    "Sustaining Momentum",
    "Looking Ahead",
];

const CONTENT_OPENERS: &[&str] = &[
    "In this lesson we explore",
    "This lesson introduces",
    "Here we take a closer look at",
    "Let's break down",
];

const CONTENT_CLOSERS: &[&str] = &[
    "Think about how this applies in your own community.",
    "Try discussing this with someone in one of your communities.",
    "Write down one action you could take this week.",
    "Notice where you have seen this in the news recently.",
];

/// Stateless templated generator
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseGenerator;

impl CourseGenerator {
    pub fn generate<R: Rng + ?Sized>(
        &self,
        topic: &str,
        difficulty: Difficulty,
        lesson_count: usize,
        rng: &mut R,
    ) -> CoreResult<GeneratedCourse> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(CoreError::validation("topic must not be empty"));
        }
        if topic.chars().count() > MAX_TOPIC_LEN {
            return Err(CoreError::validation(format!(
                "topic must be at most {} characters",
                MAX_TOPIC_LEN
            )));
        }
        if !(MIN_LESSONS..=MAX_LESSONS).contains(&lesson_count) {
            return Err(CoreError::validation(format!(
                "lesson count must be between {} and {}",
                MIN_LESSONS, MAX_LESSONS
            )));
        }

        let title = pick(TITLE_TEMPLATES, rng).replace("{topic}", topic);

        let mut angles: Vec<&str> = LESSON_ANGLES.to_vec();
        // keep "Foundations" first, shuffle the middle, keep "Taking Action" last when it fits
        let first = angles.remove(0);
        angles.shuffle(rng);
        let mut chosen: Vec<&str> = std::iter::once(first)
            .chain(angles.into_iter())
            .take(lesson_count)
            .collect();
        if lesson_count > 1 {
            if let Some(pos) = chosen.iter().position(|a| *a == "Taking Action") {
                let action = chosen.remove(pos);
                chosen.push(action);
            }
        }

        let lessons = chosen
            .iter()
            .enumerate()
            .map(|(i, angle)| self.lesson(topic, angle, i + 1, difficulty, rng))
            .collect::<Vec<_>>();

        let multiplier = difficulty.reward_multiplier();
        Ok(GeneratedCourse {
            description: format!(
                "A {} course of {} lessons on {}. Complete every lesson to earn the course reward.",
                difficulty.as_str(),
                lesson_count,
                topic
            ),
            title,
            topic: topic.to_string(),
            difficulty,
            estimated_minutes: difficulty.minutes_per_lesson() * lesson_count as i32,
            reward_tokens: 50 * lesson_count as i64 * multiplier,
            reward_experience: 20 * lesson_count as i64 * multiplier,
            lessons,
        })
    }

    fn lesson<R: Rng + ?Sized>(
        &self,
        topic: &str,
        angle: &str,
        number: usize,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> GeneratedLesson {
        let content = format!(
            "{} {} of {}. {} {}",
            pick(CONTENT_OPENERS, rng),
            angle.to_lowercase(),
            topic,
            match difficulty {
                Difficulty::Beginner => "We start from first principles and everyday examples.",
                Difficulty::Intermediate => "We connect the basics to real campaigns and trade-offs.",
                Difficulty::Advanced => "We examine strategy, evidence and long-term consequences.",
            },
            pick(CONTENT_CLOSERS, rng),
        );

        let answer_index = rng.gen_range(0..4);
        let mut options: Vec<String> = vec![
            format!("It is unrelated to {}", topic),
            format!("Only experts can take part in {}", topic),
            "It only matters during elections".to_string(),
        ];
        options.insert(
            answer_index,
            format!("It shapes how people act together on {}", topic),
        );

        GeneratedLesson {
            title: format!("Lesson {}: {}", number, angle),
            content,
            quiz: vec![QuizQuestion {
                question: format!("Why does {} matter when looking at {}?", angle.to_lowercase(), topic),
                options,
                answer_index,
            }],
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_course_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let course = CourseGenerator
            .generate("Climate Policy", Difficulty::Intermediate, 5, &mut rng)
            .unwrap();

        assert_eq!(course.lessons.len(), 5);
        assert!(course.title.contains("Climate Policy"));
        assert_eq!(course.estimated_minutes, 75);
        assert_eq!(course.reward_tokens, 500);
        assert_eq!(course.reward_experience, 200);
        assert!(course.lessons[0].title.starts_with("Lesson 1: Foundations"));
    }

    #[test]
    fn test_quiz_answer_is_correct_option() {
        let mut rng = StdRng::seed_from_u64(42);
        let course = CourseGenerator
            .generate("Voting Rights", Difficulty::Beginner, 3, &mut rng)
            .unwrap();

        for lesson in &course.lessons {
            let quiz = &lesson.quiz[0];
            assert_eq!(quiz.options.len(), 4);
            assert!(quiz.options[quiz.answer_index].starts_with("It shapes"));
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = CourseGenerator
            .generate("Mutual Aid", Difficulty::Advanced, 4, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = CourseGenerator
            .generate("Mutual Aid", Difficulty::Advanced, 4, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_taking_action_is_last_when_present() {
        let mut rng = StdRng::seed_from_u64(3);
        let course = CourseGenerator
            .generate("Housing", Difficulty::Beginner, MAX_LESSONS, &mut rng)
            .unwrap();
        assert!(course.lessons.last().unwrap().title.ends_with("Taking Action"));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(CourseGenerator.generate("  ", Difficulty::Beginner, 3, &mut rng).is_err());
        assert!(CourseGenerator.generate("Topic", Difficulty::Beginner, 0, &mut rng).is_err());
        assert!(CourseGenerator
            .generate("Topic", Difficulty::Beginner, MAX_LESSONS + 1, &mut rng)
            .is_err());
    }
}
