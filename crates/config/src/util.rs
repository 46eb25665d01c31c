// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use figment::Figment;
use serde::de::DeserializeOwned;

/// A section of the configuration, which can be loaded and validated on its
/// own
pub trait ConfigurationSection: Sized + DeserializeOwned {
    /// Specify where this section should live relative to the root.
    const PATH: Option<&'static str> = None;

    /// Validate the configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    fn validate(
        &self,
        _figment: &Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        Ok(())
    }

    /// Extract configuration from a Figment instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration could not be loaded
    fn extract(
        figment: &Figment,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        let this: Self = if let Some(path) = Self::PATH {
            figment.extract_inner(path)?
        } else {
            figment.extract()?
        };

        this.validate(figment)?;
        Ok(this)
    }
}

/// Extension trait for [`ConfigurationSection`] to allow extracting the
/// configuration section from a [`Figment`] or return the default value if the
/// section is not present.
pub trait ConfigurationSectionExt: ConfigurationSection + Default {
    /// Extract the configuration section from the given [`Figment`], or return
    /// the default value if the section is not present.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration section is invalid.
    fn extract_or_default(
        figment: &Figment,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        match Self::PATH {
            Some(path) if !figment.contains(path) => Ok(Self::default()),
            _ => Self::extract(figment),
        }
    }
}

impl<T: ConfigurationSection + Default> ConfigurationSectionExt for T {}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    struct Limits {
        #[serde(default)]
        low: u32,
        #[serde(default)]
        high: u32,
    }

    impl ConfigurationSection for Limits {
        const PATH: Option<&'static str> = Some("limits");

        fn validate(
            &self,
            _figment: &Figment,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
            if self.low > self.high {
                return Err("limits.low must not be greater than limits.high".into());
            }

            Ok(())
        }
    }

    #[test]
    fn extract_validates() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "limits: { low: 3, high: 1 }")?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let error = Limits::extract(&figment).unwrap_err();
            assert!(error.to_string().contains("limits.low"));

            Ok(())
        });
    }

    #[test]
    fn extract_or_default_validates_present_sections() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "other: {}")?;
            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let limits = Limits::extract_or_default(&figment).map_err(|e| e.to_string())?;
            assert_eq!(limits, Limits::default());

            jail.create_file("config.yaml", "limits: { low: 3, high: 1 }")?;
            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(Limits::extract_or_default(&figment).is_err());

            jail.create_file("config.yaml", "limits: { low: 1, high: 3 }")?;
            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let limits = Limits::extract_or_default(&figment).map_err(|e| e.to_string())?;
            assert_eq!(limits, Limits { low: 1, high: 3 });

            Ok(())
        });
    }
}
