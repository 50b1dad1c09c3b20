//! Export of a finished chain history.

#[cfg(feature = "csv")]
use std::error::Error;
#[cfg(feature = "csv")]
use std::fs::File;

#[cfg(feature = "csv")]
use csv::Writer;

#[cfg(feature = "csv")]
/// Saves a chain history as a CSV file.
///
/// The resulting file has a header row with the columns:
/// - `"iteration"` — the index of the entry within the history (the seed
///   state is iteration 0),
/// - `"state"` — the recorded value.
///
/// # Arguments
///
/// * `history` - The chain trajectory, seed state first. Each value must
///   implement [`std::fmt::Display`] so it can be converted to a string.
/// * `filename` - The file path where the CSV data will be written.
///
/// # Returns
///
/// Returns `Ok(())` if the CSV file was written successfully. Otherwise,
/// returns an error (wrapped in a [`Box<dyn Error>`]) if any I/O or CSV
/// formatting error occurs.
///
/// # Examples
///
/// ```rust
/// # use mini_metropolis::io::save_csv;
/// save_csv(&[0.0, 0.5, 0.5], "/tmp/chain.csv")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save_csv<T: std::fmt::Display>(
    history: &[T],
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(File::create(filename)?);

    wtr.write_record(["iteration", "state"])?;
    for (iteration, state) in history.iter().enumerate() {
        wtr.write_record(&[iteration.to_string(), state.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(all(test, feature = "csv"))]
mod tests {
    use super::*;

    #[test]
    fn save_csv_writes_one_row_per_entry() {
        let file = tempfile::NamedTempFile::new().expect("Expected temp file creation to succeed");
        let path = file.path().to_str().unwrap();

        save_csv(&[0.5, 1.5, 1.5], path).expect("Expected CSV export to succeed");

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "iteration,state\n0,0.5\n1,1.5\n2,1.5\n");
    }

    #[test]
    fn save_csv_of_empty_history_writes_header_only() {
        let file = tempfile::NamedTempFile::new().expect("Expected temp file creation to succeed");
        let path = file.path().to_str().unwrap();

        save_csv::<f64>(&[], path).expect("Expected CSV export to succeed");

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "iteration,state\n");
    }
}
