/// A canned print defect the user can pick instead of typing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommonIssue {
    pub name: &'static str,
    pub description: &'static str,
}

impl CommonIssue {
    /// The question sent on the user's behalf.
    pub fn question(&self) -> String {
        issue_question(self.name)
    }
}

pub const COMMON_ISSUES: &[CommonIssue] = &[
    CommonIssue {
        name: "Layer Shifting",
        description: "Print layers are misaligned",
    },
    CommonIssue {
        name: "Stringing",
        description: "Thin strands between printed parts",
    },
    CommonIssue {
        name: "Warping",
        description: "Corners lifting off the bed",
    },
    CommonIssue {
        name: "Under-extrusion",
        description: "Gaps or weak layers in print",
    },
    CommonIssue {
        name: "Over-extrusion",
        description: "Excess material on surfaces",
    },
    CommonIssue {
        name: "Gaps in Top Layers",
        description: "Incomplete top surface",
    },
    CommonIssue {
        name: "First Layer Issues",
        description: "Poor bed adhesion",
    },
    CommonIssue {
        name: "Layer Adhesion",
        description: "Layers separating or weak prints",
    },
];

pub fn issue_question(name: &str) -> String {
    format!("I'm having {}, how can I fix it?", name.to_lowercase())
}

/// Look an issue up by 1-based position or case-insensitive name.
pub fn find_issue(selector: &str) -> Option<&'static CommonIssue> {
    let selector = selector.trim();
    if let Ok(index) = selector.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| COMMON_ISSUES.get(i));
    }
    COMMON_ISSUES
        .iter()
        .find(|issue| issue.name.eq_ignore_ascii_case(selector))
}
