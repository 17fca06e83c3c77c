use crate::population::Population;

/// `info!` that keeps ANSI colour codes only when colourful display is enabled
#[macro_export]
macro_rules! cinfo {
    ($colorful:expr, $($arg:tt)+) => {{
        if $colorful {
            log::info!($($arg)+);
        } else {
            log::info!("{}", $crate::utils::strip_ansi(&format!($($arg)+)));
        }
    }};
}

/// Removes ANSI CSI sequences (`ESC [ ... letter`) from a string
pub fn strip_ansi(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // parameters end with the first alphabetic byte
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            stripped.push(c);
        }
    }
    stripped
}

/// (best, mean, worst) distance over the filled slots of a population
pub fn distance_stats(pop: &Population) -> (f64, f64, f64) {
    let mut best = f64::INFINITY;
    let mut worst = 0.0_f64;
    let mut sum = 0.0;
    let mut count = 0;
    for tour in pop.iter() {
        let distance = tour.distance();
        best = best.min(distance);
        worst = worst.max(distance);
        sum += distance;
        count += 1;
    }
    if count == 0 {
        return (0.0, 0.0, 0.0);
    }
    (best, sum / count as f64, worst)
}

pub fn display_generation_legend() -> String {
    "\x1b[2;97mgeneration | best distance | mean distance | worst distance\x1b[0m".to_string()
}

pub fn display_generation(pop: &Population, generation: usize) -> String {
    let (best, mean, worst) = distance_stats(pop);
    format!(
        "\x1b[1;36m#{:<6}\x1b[0m | \x1b[1;32m{:>12.2}\x1b[0m | {:>12.2} | \x1b[2;31m{:>12.2}\x1b[0m",
        generation, best, mean, worst
    )
}
