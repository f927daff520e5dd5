use crate::models::ClassOffering;

pub static CLASS_OFFERINGS: [ClassOffering; 5] = [
    ClassOffering {
        code: "AIE111",
        name: "Artificial Intelligence",
        security_token: "AI2024",
        instructor: "Dr. Ahmed Hassan",
    },
    ClassOffering {
        code: "CS211",
        name: "Data Structures",
        security_token: "DS2024",
        instructor: "Dr. Mona Ali",
    },
    ClassOffering {
        code: "MTH201",
        name: "Linear Algebra",
        security_token: "LA2024",
        instructor: "Dr. Khaled Mahmoud",
    },
    ClassOffering {
        code: "PHY101",
        name: "Physics I",
        security_token: "PH2024",
        instructor: "Dr. Sara Ibrahim",
    },
    ClassOffering {
        code: "ENG102",
        name: "Technical Writing",
        security_token: "TW2024",
        instructor: "Dr. Omar Youssef",
    },
];

/// Looks up an offering by code, ignoring case and surrounding whitespace.
pub fn find_class(code: &str) -> Option<&'static ClassOffering> {
    let code = code.trim();
    CLASS_OFFERINGS
        .iter()
        .find(|offering| offering.code.eq_ignore_ascii_case(code))
}
