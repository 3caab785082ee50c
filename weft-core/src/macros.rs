//! Construction macros for the dynamic value model.
//!
//! These build *raw* aggregates; pass the result to `reactive` or
//! `readonly` to make it observable.

/// Build a raw record value: `record! { "a" => 1, "b" => "two" }`.
#[macro_export]
macro_rules! record {
    () => {
        $crate::reactive::Value::Record($crate::reactive::Record::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let rec = $crate::reactive::Record::new();
        $( rec.insert($key, $value); )+
        $crate::reactive::Value::Record(rec)
    }};
}

/// Build a raw list value: `list![1, 2, 3]`.
#[macro_export]
macro_rules! list {
    () => {
        $crate::reactive::Value::List($crate::reactive::List::new())
    };
    ($($item:expr),+ $(,)?) => {{
        let items = $crate::reactive::List::new();
        $( items.push($item); )+
        $crate::reactive::Value::List(items)
    }};
}

/// Build a raw map value: `map_value! { "a" => 1 }`.
#[macro_export]
macro_rules! map_value {
    () => {
        $crate::reactive::Value::Map($crate::reactive::MapCell::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let map = $crate::reactive::MapCell::new();
        $( map.insert(
            $crate::reactive::Value::from($key),
            $crate::reactive::Value::from($value),
        ); )+
        $crate::reactive::Value::Map(map)
    }};
}

/// Build a raw set value: `set_value![1, 2, 3]`.
#[macro_export]
macro_rules! set_value {
    () => {
        $crate::reactive::Value::Set($crate::reactive::SetCell::new())
    };
    ($($item:expr),+ $(,)?) => {{
        let set = $crate::reactive::SetCell::new();
        $( set.insert($crate::reactive::Value::from($item)); )+
        $crate::reactive::Value::Set(set)
    }};
}
