use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::SliceRandom;

/// 生成 URL 安全的随机令牌（字母与数字）
pub fn generate_url_safe_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// 生成满足密码策略的随机密码
pub fn generate_password(len: usize) -> String {
    let len = len.max(12);
    let mut rng = rand::rng();
    let mut password: Vec<char> = vec![
        rng.random_range('A'..='Z'),
        rng.random_range('a'..='z'),
        rng.random_range('0'..='9'),
    ];
    password.extend(
        (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len - password.len())
            .map(char::from),
    );
    password.shuffle(&mut rng);
    password.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validate::validate_password;

    #[test]
    fn test_url_safe_token() {
        let token = generate_url_safe_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_url_safe_token(32));
    }

    #[test]
    fn test_generated_password_meets_policy() {
        for _ in 0..20 {
            let password = generate_password(16);
            assert_eq!(password.len(), 16);
            assert!(validate_password(&password).is_valid, "{password}");
        }
    }
}
