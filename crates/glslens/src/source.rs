use std::borrow::Cow;

use crate::version::GlslVersion;

/// Profile named by a `#version` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Profile {
    Core,
    Compatibility,
    Es,
}

/// The `#version` line the compiler will see, whether the caller wrote it or
/// it was filled in from the requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VersionDirective {
    pub number: i32,
    pub profile: Profile,
}

impl VersionDirective {
    fn defaulted(version: GlslVersion) -> Self {
        let profile = match version.get() {
            100 | 300 | 310 | 320 => Profile::Es,
            _ => Profile::Core,
        };
        Self {
            number: version.get(),
            profile,
        }
    }

    /// Reads `#version N [profile]` from the first line that starts with it.
    fn declared(source: &str) -> Option<Self> {
        let line = source.lines().find_map(|line| {
            let rest = line.trim_start().strip_prefix('#')?;
            rest.trim_start().strip_prefix("version")
        })?;
        let mut words = line.split_whitespace();
        let number = words.next()?.parse().ok()?;
        let profile = match words.next() {
            Some("es") => Profile::Es,
            Some("compatibility") => Profile::Compatibility,
            // A bare `#version 100` is the ES 1.00 language.
            None if number == 100 => Profile::Es,
            _ => Profile::Core,
        };
        Some(Self { number, profile })
    }

    pub fn is_es(self) -> bool {
        self.profile == Profile::Es
    }

    /// Whether glslang will target SPIR-V for this language version.
    #[cfg_attr(not(feature = "shaderc"), allow(dead_code))]
    pub fn spirv_capable(self, vulkan: bool) -> bool {
        match self.profile {
            Profile::Es => self.number >= 310,
            Profile::Compatibility => false,
            Profile::Core if vulkan => self.number >= 140,
            Profile::Core => self.number >= 330,
        }
    }

    /// naga's GLSL frontend only implements the desktop 440 to 460 languages.
    pub fn naga_supported(self) -> bool {
        self.profile == Profile::Core && (440..=460).contains(&self.number)
    }
}

/// Shader text as handed to the compilers, plus the bookkeeping needed to
/// report positions against the caller's original text.
#[derive(Debug, Clone)]
pub(crate) struct PreparedSource<'a> {
    text: Cow<'a, str>,
    header_len: usize,
    header_lines: u32,
    directive: VersionDirective,
    line_starts: Vec<usize>,
}

impl<'a> PreparedSource<'a> {
    /// Prepends `#version` when the source does not declare one, mirroring
    /// how glslang treats the requested version as a default. The `#line 1`
    /// that follows keeps compiler line numbers on the caller's text.
    pub fn new(source: &'a str, version: GlslVersion) -> Self {
        let (text, directive) = match VersionDirective::declared(source) {
            Some(directive) => (Cow::Borrowed(source), directive),
            None => {
                let directive = VersionDirective::defaulted(version);
                let profile = if directive.is_es() { " es" } else { "" };
                let text = format!("#version {}{profile}\n#line 1\n{source}", directive.number);
                (Cow::Owned(text), directive)
            }
        };

        let header_len = text.len() - source.len();
        let header_lines = text[..header_len].matches('\n').count() as u32;
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(at, _)| at + 1))
            .collect();

        Self {
            text,
            header_len,
            header_lines,
            directive,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn directive(&self) -> VersionDirective {
        self.directive
    }

    /// The compiled text with the injected header folded onto the caller's
    /// first line. Byte offsets are unchanged, so spans from the compiled text
    /// render with the caller's line numbers.
    pub fn display_text(&self) -> Cow<'_, str> {
        if self.header_len == 0 {
            return Cow::Borrowed(&self.text);
        }
        let header = self.text[..self.header_len].replace('\n', " ");
        Cow::Owned(format!("{header}{}", &self.text[self.header_len..]))
    }

    /// 1-based line of `offset` in the caller's text.
    pub fn line_of(&self, offset: usize) -> u32 {
        let line = self.line_starts.partition_point(|&start| start <= offset) as u32;
        line.saturating_sub(self.header_lines).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(value: i32) -> GlslVersion {
        GlslVersion::new(value).unwrap()
    }

    #[test]
    fn default_version_is_prepended_only_when_missing() {
        let source = PreparedSource::new("void main() {}\n", version(450));
        assert_eq!(source.text(), "#version 450\n#line 1\nvoid main() {}\n");
        assert_eq!(source.directive().profile, Profile::Core);

        let es = PreparedSource::new("void main() {}\n", version(300));
        assert!(es.text().starts_with("#version 300 es\n"));
        assert!(es.directive().is_es());

        let explicit = PreparedSource::new("#version 460\nvoid main() {}\n", version(450));
        assert!(matches!(explicit.text, Cow::Borrowed(_)));
        assert_eq!(explicit.directive().number, 460);
    }

    #[test]
    fn declared_directive_wins_over_requested_version() {
        let source = PreparedSource::new("  # version 330 compatibility\n", version(450));
        assert_eq!(
            source.directive(),
            VersionDirective {
                number: 330,
                profile: Profile::Compatibility
            }
        );
        let legacy = PreparedSource::new("#version 100\n", version(450));
        assert!(legacy.directive().is_es());
    }

    #[test]
    fn lines_refer_to_the_callers_text() {
        let source = PreparedSource::new("void main() {\n  nope;\n}\n", version(450));
        let offset = source.text().find("nope").unwrap();
        assert_eq!(source.line_of(offset), 2);
        assert_eq!(source.line_of(0), 1);

        let display = source.display_text();
        assert_eq!(display.len(), source.text().len());
        assert_eq!(display.lines().position(|l| l.contains("nope")), Some(1));
    }

    #[test]
    fn spirv_and_naga_version_gates() {
        let core = |number| VersionDirective {
            number,
            profile: Profile::Core,
        };
        assert!(core(330).spirv_capable(false));
        assert!(!core(150).spirv_capable(false));
        assert!(core(150).spirv_capable(true));
        assert!(!VersionDirective::defaulted(version(300)).spirv_capable(false));
        assert!(VersionDirective::defaulted(version(310)).spirv_capable(false));
        assert!(core(450).naga_supported());
        assert!(!core(330).naga_supported());
        assert!(!VersionDirective::defaulted(version(320)).naga_supported());
    }
}
