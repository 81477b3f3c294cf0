/// 定义以字符串形式存储的枚举
///
/// 自动生成：
/// - serde 序列化名称
/// - as_str() / all()
/// - Display / FromStr
#[macro_export]
macro_rules! define_string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )*
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)*
                }
            }

            pub fn all() -> &'static [$name] {
                &[$($name::$variant,)*]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)*
                    _ => Err(format!("Invalid {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::define_string_enum! {
        pub enum Sample {
            First => "first",
            SecondValue => "second_value",
        }
    }

    #[test]
    fn test_string_enum_conversions() {
        assert_eq!(Sample::SecondValue.as_str(), "second_value");
        assert_eq!("first".parse::<Sample>(), Ok(Sample::First));
        assert!("third".parse::<Sample>().is_err());
        assert_eq!(Sample::all().len(), 2);
        assert_eq!(
            serde_json::to_string(&Sample::SecondValue).unwrap(),
            "\"second_value\""
        );
    }
}
