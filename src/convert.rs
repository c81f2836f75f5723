//! Human-readable byte formatting.

/// Format a KiB quantity with a binary-unit suffix and one decimal.
pub fn kib_to_human(kib: f64) -> String {
    const UNITS: [&str; 8] = ["K", "M", "G", "T", "P", "E", "Z", "Y"];
    const STEP: f64 = 1024.0;

    let (sign, kib) = if kib < 0.0 { ("-", -kib) } else { ("", kib) };

    if kib < STEP {
        return format!("{sign}{kib:.1}{}iB", UNITS[0]);
    }

    let exp = (kib.ln() / STEP.ln()) as usize;
    let exp = exp.min(UNITS.len() - 1);
    format!("{sign}{:.1}{}iB", kib / STEP.powi(exp as i32), UNITS[exp])
}
