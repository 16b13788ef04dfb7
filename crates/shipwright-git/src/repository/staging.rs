use std::path::Path;

use crate::Result;

use super::Repository;

impl Repository {
    /// Stages each path; paths missing from the working tree are staged as
    /// deletions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GitError::OutsideWorkdir`] for absolute paths outside the
    /// work tree, or an error if staging any of the files fails.
    pub fn stage_files(&self, paths: &[&Path]) -> Result<()> {
        let mut index = self.inner.index()?;

        for path in paths {
            let relative_path = self.relative_path(path)?;

            if self.workdir().join(&relative_path).exists() {
                index.add_path(&relative_path)?;
            } else if index.get_path(&relative_path, 0).is_some() {
                index.remove_path(&relative_path)?;
            }
        }

        index.write()?;
        Ok(())
    }
}
