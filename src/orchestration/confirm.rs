//! Interactive confirmation before the first publish

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Ask once whether to republish `from` as `to`.
///
/// Dry runs and `--yes` proceed without asking. Only `y` / `yes`
/// (case-insensitive) proceed; any other answer declines.
///
/// # Errors
///
/// Fails when the answer cannot be read from stdin.
pub async fn confirm_or_skip(dry_run: bool, yes: bool, from: &str, to: &str) -> anyhow::Result<bool> {
    if dry_run || yes {
        return Ok(true);
    }

    print!("About to republish {} -> {}. Continue? [y/N] ", from, to);
    io::stdout().flush().await?;

    let mut reader = BufReader::new(io::stdin());
    read_answer(&mut reader).await
}

/// Read one answer line from `reader`
pub async fn read_answer<R>(reader: &mut R) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut answer = String::new();
    let read = reader.read_line(&mut answer).await?;
    if read == 0 {
        anyhow::bail!("no answer: stdin closed");
    }

    let answer = answer.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn answer(input: &str) -> anyhow::Result<bool> {
        let mut reader = input.as_bytes();
        read_answer(&mut reader).await
    }

    #[tokio::test]
    async fn test_accepts_y_and_yes() {
        assert!(answer("y\n").await.unwrap());
        assert!(answer("YES\n").await.unwrap());
        assert!(answer("  yes  \n").await.unwrap());
    }

    #[tokio::test]
    async fn test_declines_anything_else() {
        assert!(!answer("n\n").await.unwrap());
        assert!(!answer("\n").await.unwrap());
        assert!(!answer("yep\n").await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_stdin_is_an_error() {
        assert!(answer("").await.is_err());
    }

    #[tokio::test]
    async fn test_skipped_for_dry_run_and_yes() {
        assert!(confirm_or_skip(true, false, "old", "new").await.unwrap());
        assert!(confirm_or_skip(false, true, "old", "new").await.unwrap());
    }
}
