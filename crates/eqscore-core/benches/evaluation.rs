use criterion::{black_box, criterion_group, criterion_main, Criterion};

use eqscore_core::model::{AnswerOption, Difficulty, Question, QuestionType, Responses};
use eqscore_core::statistics::compute_cohort_stats;
use eqscore_core::{evaluate, RatingTable};

fn make_battery(modules: usize, per_module: usize) -> Vec<Question> {
    let mut questions = Vec::new();
    for m in 0..modules {
        for i in 0..per_module {
            let id = format!("m{m}-q{i}");
            // every fourth item pairs with the next one as its reversed twin
            let pair = (i % 4 < 2).then(|| format!("m{m}-p{}", i / 4));
            let reversed = i % 4 == 1;
            questions.push(Question {
                text: format!("Statement {id}"),
                id,
                question_type: QuestionType::Likert,
                module: format!("Module {m}"),
                submodule: format!("Facet {}", i % 3),
                category: String::new(),
                difficulty: Difficulty::Medium,
                options: (1..=5)
                    .map(|v| AnswerOption {
                        label: format!("Level {v}"),
                        value: v.to_string(),
                        score: (if reversed { 6 - v } else { v }) as f64 * 20.0,
                    })
                    .collect(),
                inconsistency_pair_id: pair,
                is_reversed: reversed,
                weight: None,
            });
        }
    }
    questions
}

fn make_responses(questions: &[Question]) -> Responses {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id.clone(), (i % 5 + 1).to_string()))
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for (name, modules, per_module) in [("small", 4, 8), ("standard", 5, 20), ("large", 10, 100)] {
        let questions = make_battery(modules, per_module);
        let responses = make_responses(&questions);
        group.bench_function(name, |b| {
            b.iter(|| evaluate(black_box(&questions), black_box(&responses)))
        });
    }

    group.finish();
}

fn bench_cohort_stats(c: &mut Criterion) {
    let questions = make_battery(5, 20);
    let responses = make_responses(&questions);
    let result = evaluate(&questions, &responses).expect("bench battery is valid");
    let results = vec![result; 1000];
    let table = RatingTable::inconsistency_default();

    c.bench_function("cohort_stats/1000", |b| {
        b.iter(|| compute_cohort_stats(black_box(&results), black_box(&table)))
    });
}

criterion_group!(benches, bench_evaluate, bench_cohort_stats);
criterion_main!(benches);
