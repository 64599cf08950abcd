use colored::Colorize;
use itertools::Itertools;
use lyneate::Report;

use crate::{source::CodeArea, util::label_colors};

/// `format!` with every argument highlighted.
#[macro_export]
macro_rules! special_fmt {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_imports)]
        use colored::Colorize;
        format!($fmt, $($arg.to_string().bright_white().bold()),*)
    }};
}

pub struct ErrorReport {
    pub typ: &'static str,
    pub msg: &'static str,
    pub labels: Vec<(CodeArea, String)>,
}

impl ErrorReport {
    pub fn display(self) {
        println!(
            "\n{}: {}",
            self.typ.bright_red().bold(),
            self.msg.bright_yellow()
        );

        let colors = label_colors(self.labels.len()).collect_vec();
        let labelled = self.labels.into_iter().zip(colors).collect_vec();

        // one snippet per module, in order of first appearance
        for (_, group) in &labelled
            .into_iter()
            .group_by(|((area, _), _)| area.src.clone())
        {
            let group = group.collect_vec();
            let src = group[0].0 .0.src.clone();

            println!("{} {}", "in".dimmed(), src.name().bright_blue());

            Report::new_byte_spanned(
                src.code(),
                group
                    .into_iter()
                    .map(|((area, msg), color)| (area.span.into(), msg, color)),
            )
            .display();
        }
    }
}
