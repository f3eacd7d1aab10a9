//! Disease classes the reference model is trained on. Informational only:
//! labels returned by the service are never checked against this list.

pub const CLASS_NAMES: [&str; 9] = [
    "Healthy",
    "Bacterial Leaf Spot",
    "Early Blight",
    "Late Blight",
    "Leaf Mold",
    "Septoria Leaf Spot",
    "Yellow Leaf Curl Virus",
    "Powdery Mildew",
    "Downy Mildew",
];

pub fn is_known_class(label: &str) -> bool {
    CLASS_NAMES.iter().any(|c| c.eq_ignore_ascii_case(label.trim()))
}
