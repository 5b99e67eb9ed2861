//! @ai:module:intent Aligned benchmark summary tables for the load log
//! @ai:module:layer infrastructure
//! @ai:module:public_api SummaryTable
//! @ai:module:stateless true

use crate::benchmark::Benchmark;
use std::collections::HashSet;

const INDENT: usize = 3;
const DEFAULT_WIDTH: usize = 10;

/// @ai:intent Column layout shared by every table of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryTable {
    name_width: usize,
    data_source_width: usize,
}

impl SummaryTable {
    /// @ai:intent Size columns to the longest name and data source among all benchmarks
    /// @ai:effects pure
    pub fn new<'a>(benchmarks: impl IntoIterator<Item = &'a Benchmark>) -> Self {
        let mut name_width = None;
        let mut data_source_width = None;

        for benchmark in benchmarks {
            name_width = name_width.max(Some(benchmark.name().chars().count()));
            data_source_width = data_source_width.max(Some(benchmark.data_source().chars().count()));
        }

        Self {
            name_width: name_width.unwrap_or(DEFAULT_WIDTH) + INDENT,
            data_source_width: data_source_width.unwrap_or(DEFAULT_WIDTH) + INDENT,
        }
    }

    fn line(&self, name: &str, data_source: &str, runs: &str, prewarms: &str, concurrency: &str) -> String {
        format!(
            "\t| {:<name$} | {:<source$} | {:<4} | {:<8} | {:<11} |",
            name,
            data_source,
            runs,
            prewarms,
            concurrency,
            name = self.name_width,
            source = self.data_source_width,
        )
    }

    /// @ai:intent Header plus one row per distinct benchmark line, in input order
    /// @ai:effects pure
    pub fn render<'a>(&self, benchmarks: impl IntoIterator<Item = &'a Benchmark>) -> Vec<String> {
        let mut seen = HashSet::new();
        let header = self.line("Benchmark Name", "Data Source", "Runs", "Prewarms", "Concurrency");

        std::iter::once(header)
            .chain(
                benchmarks
                    .into_iter()
                    .map(|benchmark| {
                        self.line(
                            benchmark.name(),
                            benchmark.data_source(),
                            &benchmark.runs().to_string(),
                            &benchmark.prewarm_runs().to_string(),
                            &benchmark.concurrency().to_string(),
                        )
                    })
                    .filter(|row| seen.insert(row.clone())),
            )
            .collect()
    }

    /// @ai:intent Log a titled table at info level
    /// @ai:effects io
    pub fn log<'a>(&self, title: &str, benchmarks: impl IntoIterator<Item = &'a Benchmark>) {
        tracing::info!("{}", title);
        for line in self.render(benchmarks) {
            tracing::info!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::BenchmarkBuilder;
    use pretty_assertions::assert_eq;

    fn benchmark(name: &str, data_source: &str, runs: u32) -> Benchmark {
        BenchmarkBuilder::new(name, "seq", Vec::new())
            .with_data_source(data_source)
            .with_runs(runs)
            .build()
            .unwrap()
    }

    #[test]
    fn test_widths_from_longest_values() {
        let benchmarks = vec![benchmark("simple", "foo", 3), benchmark("concurrent", "presto", 10)];
        let table = SummaryTable::new(&benchmarks);

        assert_eq!(
            table,
            SummaryTable {
                name_width: 13,
                data_source_width: 9
            }
        );
        assert_eq!(
            table.render(&benchmarks),
            vec![
                "\t| Benchmark Name | Data Source | Runs | Prewarms | Concurrency |",
                "\t| simple        | foo       | 3    | 0        | 1           |",
                "\t| concurrent    | presto    | 10   | 0        | 1           |",
            ]
        );
    }

    #[test]
    fn test_default_width_when_empty() {
        let table = SummaryTable::new(std::iter::empty());
        assert_eq!(
            table,
            SummaryTable {
                name_width: 13,
                data_source_width: 13
            }
        );
        assert_eq!(table.render(std::iter::empty()).len(), 1);
    }

    #[test]
    fn test_duplicate_rows_collapsed() {
        let benchmarks = vec![
            benchmark("multi", "foo", 3),
            benchmark("multi", "foo", 3),
            benchmark("multi", "foo", 5),
        ];
        let table = SummaryTable::new(&benchmarks);

        assert_eq!(table.render(&benchmarks).len(), 3);
    }
}
