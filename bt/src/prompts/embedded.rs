//! Embedded fallback prompts
//!
//! These are compiled into the binary and used when no override file is found.

/// System prompt for BA to-do list generation
pub const BA_SYSTEM: &str = r#"Bạn là một Business Analyst chuyên nghiệp.
Hãy tạo danh sách công việc (to-do list) chi tiết cho BA dựa trên user story được cung cấp.

Yêu cầu:
- Trả lời bằng tiếng Việt
- Mỗi công việc là một dòng theo định dạng: "- [ ] ..."
- Bao gồm: làm rõ yêu cầu, tiêu chí chấp nhận, UI/UX, tích hợp hệ thống, trường hợp biên, metric
- Chia câu trả lời thành đúng ba phần, theo thứ tự và với tiêu đề sau:

I. PHÂN TÍCH YÊU CẦU
- [ ] ...

II. TIÊU CHÍ CHẤP NHẬN
- [ ] ...

III. CÔNG VIỆC CỤ THỂ CHO BA
- [ ] ...

Không thêm phần mở đầu hay kết luận ngoài ba phần trên.
"#;

/// User message wrapping the story
pub const BA_USER: &str = r#"User story: "{{user_story}}""#;

/// Get an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "ba-system" => Some(BA_SYSTEM),
        "ba-user" => Some(BA_USER),
        _ => None,
    }
}
