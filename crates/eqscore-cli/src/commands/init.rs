//! The `eqscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create eqscore.toml
    if std::path::Path::new("eqscore.toml").exists() {
        println!("eqscore.toml already exists, skipping.");
    } else {
        std::fs::write("eqscore.toml", SAMPLE_CONFIG)?;
        println!("Created eqscore.toml");
    }

    // Create example battery
    std::fs::create_dir_all("batteries")?;
    let example_path = std::path::Path::new("batteries/example.toml");
    if example_path.exists() {
        println!("batteries/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BATTERY)?;
        println!("Created batteries/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust rating bands in eqscore.toml");
    println!("  2. Run: eqscore validate --battery batteries/example.toml");
    println!("  3. Run: eqscore evaluate --battery batteries/example.toml --answers answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# eqscore configuration

parallelism = 4
output_dir = "./eqscore-results"

# Overall EQ rating, checked from the top: first band with score >= bound wins.
[eq_rating]
direction = "at_least"
fallback = "Low"

[[eq_rating.bands]]
bound = 80.0
label = "Very High"

[[eq_rating.bands]]
bound = 65.0
label = "High"

[[eq_rating.bands]]
bound = 45.0
label = "Average"

[[eq_rating.bands]]
bound = 30.0
label = "Below Average"

# Inconsistency rating: first band with index <= bound wins.
[inconsistency_rating]
direction = "at_most"
fallback = "Poor"

[[inconsistency_rating.bands]]
bound = 10.0
label = "Excellent"

[[inconsistency_rating.bands]]
bound = 25.0
label = "Good"

[[inconsistency_rating.bands]]
bound = 45.0
label = "Moderate"
"#;

const EXAMPLE_BATTERY: &str = r#"[battery]
id = "example"
name = "Example EQ Battery"
description = "A small battery to get started"

[[questions]]
id = "q1"
text = "I notice my mood changing during the day."
module = "Self-Awareness"
submodule = "Emotional Insight"
inconsistency_pair_id = "p1"

[[questions]]
id = "q2"
text = "I rarely know why I feel the way I do."
module = "Self-Awareness"
submodule = "Emotional Insight"
inconsistency_pair_id = "p1"
is_reversed = true

[[questions]]
id = "q3"
text = "I can tell when a friend is upset even if they hide it."
module = "Empathy"
submodule = "Perspective Taking"

[[questions]]
id = "q4"
text = "I listen without interrupting when someone shares a problem."
module = "Empathy"
submodule = "Perspective Taking"
"#;
