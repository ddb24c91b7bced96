//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        f.map_or_else(|| "/".to_string(), |f| format!("{f:.6}"))
    }

    writeln!(w, "Classifier `{name}`:")?;
    writeln!(w, "{S4}Background slices: {}", p.get_trivial())?;
    writeln!(w, "{S4}Lung slices: {}", p.get_target())?;
    writeln!(w, "{S4}Candidate pairs: {}", p.get_pairs())?;
    writeln!(w, "{S4}Closed pairs: {}", p.get_closed())?;
    writeln!(w, "{S4}Voxels added: {}", p.get_added())?;
    writeln!(
        w,
        "{S4}Average voxels added: {} per slice",
        f64_to_display(p.get_avg_added())
    )?;
    writeln!(w, "{S4}Correction time: {} us", p.get_target_time_us())?;
    writeln!(
        w,
        "{S4}Average correction time: {} us",
        f64_to_display(p.get_avg_target_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros().to_string());
    write!(
        w,
        "{S4}Most time-consuming slice costs {} us",
        t.as_deref().unwrap_or("/")
    )?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        utils::sep_to(&mut lock).unwrap();
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut lock).unwrap();
            writeln!(lock).unwrap();
            utils::sep_to(&mut lock).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_empty_profile() {
        let p = Profile::new().finish();
        let mut buf = vec![];
        describe_into("never", &p, &mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("Classifier `never`:"));
        assert!(s.contains("Average voxels added: / per slice"));
        assert!(s.ends_with("costs / us"));
    }
}
