use crate::level::{Level, LevelError};
use std::fs;
use std::path::Path;
use tracing::info;

/// A collection of levels.
#[derive(Debug, Clone)]
pub struct Levels {
    levels: Vec<Level>,
    titles: Vec<Option<String>>,
}

impl Levels {
    /// Parse a collection of levels from a string.
    ///
    /// The format uses:
    /// - Lines starting with `;` as level separators/comments. The comment
    ///   text becomes the title of the level that follows it.
    /// - The level characters understood by [`Level::from_text`]
    /// - Empty lines between levels (optional)
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut collection = Levels {
            levels: Vec::new(),
            titles: Vec::new(),
        };
        let mut current_level = String::new();
        let mut title = None;

        for line in contents.lines() {
            if let Some(comment) = line.trim_start().strip_prefix(';') {
                collection.flush(&mut current_level, &mut title)?;
                let comment = comment.trim();
                if !comment.is_empty() {
                    title = Some(comment.to_string());
                }
                continue;
            }

            if line.is_empty() {
                // Empty line within a level - end of level
                collection.flush(&mut current_level, &mut title)?;
                continue;
            }

            current_level.push_str(line);
            current_level.push('\n');
        }

        // Don't forget the last level if file doesn't end with empty line
        collection.flush(&mut current_level, &mut title)?;

        Ok(collection)
    }

    fn flush(&mut self, current: &mut String, title: &mut Option<String>) -> Result<(), LevelError> {
        if current.is_empty() {
            return Ok(());
        }
        let level = Level::from_text(current).map_err(|err| match err {
            LevelError::InvalidLevel(msg) => {
                LevelError::InvalidLevel(format!("level {}: {}", self.levels.len() + 1, msg))
            }
            other => other,
        })?;
        self.levels.push(level);
        self.titles.push(title.take());
        current.clear();
        Ok(())
    }

    /// Parse a collection of levels from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let levels = Self::from_text(&contents)?;
        info!(path = %path.display(), count = levels.len(), "loaded level collection");
        Ok(levels)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Result<&Level, LevelError> {
        self.levels.get(index).ok_or(LevelError::NotFound {
            index,
            len: self.levels.len(),
        })
    }

    /// Title of the nth level, taken from the comment line preceding it.
    pub fn title(&self, index: usize) -> Option<&str> {
        self.titles.get(index).and_then(|t| t.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    /// Get the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<Level> for Levels {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        let levels: Vec<Level> = iter.into_iter().collect();
        let titles = vec![None; levels.len()];
        Levels { levels, titles }
    }
}
