//! Textual rendering of [`Directive`]s into preprocessor source.

use super::Directive;
use crate::error::Result;
use std::fmt::Write as FmtWrite;

/// Renders directives in order. Output depends on nothing but the input.
///
/// # Errors
/// Returns an error only if formatting into memory fails.
pub fn render(directives: &[Directive]) -> Result<String> {
    let mut w = String::new();
    for directive in directives {
        render_directive(&mut w, directive)?;
    }
    Ok(w)
}

fn render_directive(w: &mut String, directive: &Directive) -> Result<()> {
    match directive {
        Directive::Banner { generator, timestamp, definitions } => {
            writeln!(w, "/*")?;
            writeln!(w, "WARNING: This file was autogenerated by\n")?;
            match timestamp {
                Some(timestamp) => writeln!(w, "   {generator} on {timestamp}\n")?,
                None => writeln!(w, "   {generator}\n")?,
            }
            writeln!(w, "   Do not modify it or your changes will be overwritten!")?;
            writeln!(w, "   Modify {definitions} instead.")?;
            writeln!(w, "*/")?;
        },
        Directive::IncludeGuardBegin(guard) => {
            writeln!(w, "#ifndef {guard}")?;
            writeln!(w, "#define {guard}\n")?;
        },
        Directive::IncludeGuardEnd(guard) => {
            writeln!(w, "\n#endif /* {guard} */")?;
        },
        Directive::Section(title) => {
            writeln!(w, "\n/* {title} */")?;
        },
        Directive::Include(path) => {
            writeln!(w, "#include {path}")?;
        },
        Directive::UndefGuard(feature) => {
            writeln!(w, "\n// {feature} is external")?;
            writeln!(w, "#if defined({feature})")?;
            writeln!(w, "#undef {feature}")?;
            writeln!(w, "#endif")?;
        },
        Directive::ImplicationBlock { antecedent, consequent } => {
            writeln!(w, "\n// {antecedent} implies {consequent}")?;
            writeln!(w, "#if defined({antecedent}) && !defined({consequent})")?;
            writeln!(w, "#define {consequent}")?;
            writeln!(w, "#endif")?;
        },
        Directive::DerivationBlock { feature, human, rendered } => {
            writeln!(w, "\n// {feature} equals {human}")?;
            writeln!(w, "#ifdef {feature}")?;
            writeln!(w, "#warning {feature} is a derived switch and should not be set manually!")?;
            writeln!(w, "#elif {rendered}")?;
            writeln!(w, "#define {feature}")?;
            writeln!(w, "#endif")?;
        },
        Directive::RequirementBlock { feature, human, rendered } => {
            writeln!(w, "\n// {feature} requires {human}")?;
            writeln!(w, "#if defined({feature}) && !({rendered})")?;
            writeln!(w, "#error Feature {feature} requires {human}")?;
            writeln!(w, "#endif")?;
        },
        Directive::NameTableDecl { table, count } => {
            writeln!(w, "\nextern const char* {table}[];")?;
            writeln!(w, "extern const int {count};")?;
        },
        Directive::NameTableBegin { table } => {
            writeln!(w, "const char* {table}[] = {{")?;
        },
        Directive::NameTableEntry(feature) => {
            writeln!(w, "#ifdef {feature}")?;
            writeln!(w, "  \"{feature}\",")?;
            writeln!(w, "#endif")?;
        },
        Directive::NameTableEnd { table, count } => {
            writeln!(w, "}};\n")?;
            writeln!(w, "const int {count} = sizeof({table})/sizeof(char*);")?;
        },
    }
    Ok(())
}
