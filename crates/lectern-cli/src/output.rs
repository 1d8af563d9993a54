use std::io::Write;
use std::path::Path;

use lectern_core::corpus::search::{CatalogStats, SearchHit};
use lectern_core::{
    Candidate, ConfidenceBand, EngineInfo, LookupResult, ParsedCitation, PrepareSummary,
    ValidationReport,
};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn band_label(band: ConfidenceBand, color: ColorMode) -> String {
    let label = band.to_string().to_uppercase();
    if !color.enabled() {
        return label;
    }
    match band {
        ConfidenceBand::High => label.green().to_string(),
        ConfidenceBand::Medium => label.yellow().to_string(),
        ConfidenceBand::Low => label.red().to_string(),
    }
}

/// Print ranked candidates, best first, followed by any diagnostics.
pub fn print_lookup(
    w: &mut dyn Write,
    result: &LookupResult,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", result.original_citation.bold())?;
    } else {
        writeln!(w, "{}", result.original_citation)?;
    }

    if result.candidates.is_empty() {
        if color.enabled() {
            writeln!(w, "  {}", "No candidates found".red())?;
        } else {
            writeln!(w, "  No candidates found")?;
        }
    }

    for (i, candidate) in result.candidates.iter().enumerate() {
        writeln!(w)?;
        print_candidate(w, i + 1, candidate, color)?;
    }

    if !result.diagnostics.is_empty() {
        writeln!(w)?;
        for diagnostic in &result.diagnostics {
            let stage = format!("{:?}", diagnostic.stage).to_lowercase();
            let msg = format!("[{stage}] {}", diagnostic.message);
            if color.enabled() {
                writeln!(w, "  {}", msg.dimmed())?;
            } else {
                writeln!(w, "  {msg}")?;
            }
        }
    }
    Ok(())
}

fn print_candidate(
    w: &mut dyn Write,
    rank: usize,
    candidate: &Candidate,
    color: ColorMode,
) -> std::io::Result<()> {
    let meta = &candidate.metadata;
    writeln!(
        w,
        "{}. {} [{} {:.2}]",
        rank,
        meta.range,
        band_label(candidate.band(), color),
        candidate.confidence
    )?;

    let mut provenance = meta.title.clone();
    if let Some(author) = &meta.author {
        provenance.push_str(&format!(", {author}"));
    }
    if let Some(translation) = &meta.translation {
        provenance.push_str(&format!(" ({translation})"));
    }
    if let Some(section) = &meta.section {
        provenance.push_str(&format!(" - {section}"));
    }
    if color.enabled() {
        writeln!(w, "   {}", provenance.dimmed())?;
    } else {
        writeln!(w, "   {provenance}")?;
    }

    for line in candidate.text.lines() {
        writeln!(w, "   | {line}")?;
    }
    Ok(())
}

/// Print the references of a dry-run parse.
pub fn print_parsed(w: &mut dyn Write, parsed: &ParsedCitation) -> std::io::Result<()> {
    if let Some(source_type) = parsed.source_type() {
        writeln!(w, "Type: {source_type}")?;
    }
    for (i, reference) in parsed.references.iter().enumerate() {
        writeln!(
            w,
            "  {}. {} ({}, rule {} \"{}\")",
            i + 1,
            reference,
            reference.source_type,
            reference.rule.priority(),
            reference.rule
        )?;
    }
    for error in &parsed.errors {
        writeln!(w, "  segment {} \"{}\": {}", error.index + 1, error.segment, error.error)?;
    }
    Ok(())
}

/// Print the indexed works and translations.
pub fn print_info(
    w: &mut dyn Write,
    info: &EngineInfo,
    corpus_root: Option<&Path>,
) -> std::io::Result<()> {
    if let Some(root) = corpus_root {
        writeln!(w, "Corpus: {}", root.display())?;
    }
    writeln!(w, "Literary works: {}", info.literary_works)?;
    for work in &info.available_works {
        match &work.author {
            Some(author) => writeln!(
                w,
                "  {:<20} {} by {} ({} lines)",
                work.id, work.title, author, work.lines
            )?,
            None => writeln!(w, "  {:<20} {} ({} lines)", work.id, work.title, work.lines)?,
        }
    }
    writeln!(
        w,
        "Biblical translations: {}",
        info.biblical_translations.join(", ")
    )?;
    Ok(())
}

fn quality_label(score: f64, color: ColorMode) -> String {
    let label = format!("{score:.0}/100");
    if !color.enabled() {
        return label;
    }
    if score >= 80.0 {
        label.green().to_string()
    } else if score >= 60.0 {
        label.yellow().to_string()
    } else {
        label.red().to_string()
    }
}

fn print_report(w: &mut dyn Write, report: &ValidationReport, color: ColorMode) -> std::io::Result<()> {
    writeln!(
        w,
        "  {} [{}] {} words, {} lines, {} paragraphs",
        report.title,
        quality_label(report.quality_score, color),
        report.word_count,
        report.line_count,
        report.paragraph_count
    )?;
    for issue in &report.issues {
        writeln!(w, "    - {issue}")?;
    }
    Ok(())
}

/// Print the works written by `lectern corpus prepare`.
pub fn print_prepare(
    w: &mut dyn Write,
    summary: &PrepareSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Prepared {} works", summary.works.len())?;
    for work in &summary.works {
        writeln!(w, "  {:<20} {}", work.id, work.file.display())?;
        print_report(w, &work.validation, color)?;
    }
    writeln!(w, "Average quality: {:.1}/100", summary.avg_quality_score)?;
    writeln!(w, "Catalog: {}", summary.catalog.display())?;
    Ok(())
}

/// Print one quality report per corpus text.
pub fn print_validation(
    w: &mut dyn Write,
    reports: &[ValidationReport],
    color: ColorMode,
) -> std::io::Result<()> {
    for report in reports {
        print_report(w, report, color)?;
    }
    let clean = reports.iter().filter(|r| r.is_clean()).count();
    writeln!(w, "{clean} of {} texts clean", reports.len())?;
    Ok(())
}

/// Print Gutenberg catalog hits, best first.
pub fn print_search(w: &mut dyn Write, query: &str, hits: &[SearchHit<'_>]) -> std::io::Result<()> {
    if hits.is_empty() {
        writeln!(w, "No Gutenberg texts match \"{query}\"")?;
        return Ok(());
    }
    for hit in hits {
        let entry = hit.entry;
        match entry.primary_author() {
            Some(author) => writeln!(
                w,
                "{:>6}  {:.2}  {} by {}",
                entry.text_id, hit.score, entry.title, author
            )?,
            None => writeln!(w, "{:>6}  {:.2}  {}", entry.text_id, hit.score, entry.title)?,
        }
        writeln!(w, "        {}", entry.text_url())?;
    }
    Ok(())
}

/// Print Gutenberg catalog totals.
pub fn print_stats(w: &mut dyn Write, stats: &CatalogStats) -> std::io::Result<()> {
    writeln!(w, "English texts: {}", stats.total_texts)?;
    writeln!(w, "Distinct authors: {}", stats.distinct_authors)?;
    for (author, count) in &stats.top_authors {
        writeln!(w, "  {count:>5}  {author}")?;
    }
    Ok(())
}
